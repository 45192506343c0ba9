// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Recursive subtree removal over synthetic folders.

use crate::error::{Error, FailedDelete, Result};
use crate::storage::BlobStore;
use futures_util::future;
use tokio::task::JoinHandle;

/// Delete every object under a path prefix.
///
/// The traversal works a frontier of prefixes discovered lazily by listing,
/// one listing in flight at a time; object deletions fan out as concurrent
/// tasks and are all awaited before the call returns, whether or not some
/// of them fail. Failed deletions are collected and reported together
/// through [`Error::SubtreeIncomplete`] rather than short-circuiting.
///
/// Deletion is correct with respect to the state at listing time: objects
/// created under an already-listed prefix while the removal runs are not
/// guaranteed to be visited.
pub async fn remove_subtree<B: BlobStore>(store: &B, root_path: &str) -> Result<()> {
    let root = root_path.trim_end_matches('/').to_string();
    let mut frontier: Vec<String> = vec![root.clone()];
    let mut pending: Vec<(String, JoinHandle<Result<()>>)> = Vec::new();
    let mut listing_error: Option<Error> = None;

    while let Some(prefix) = frontier.pop() {
        let listing = match store.list(&prefix).await {
            Ok(listing) => listing,
            Err(err) => {
                // Stop discovering, but still settle what is already in
                // flight below.
                listing_error = Some(err);
                break;
            }
        };

        frontier.extend(listing.sub_prefixes.into_iter().map(|node| node.path));

        for object in listing.objects {
            let store = store.clone();
            let path = object.path;
            let task = tokio::spawn({
                let path = path.clone();
                async move { store.delete(&path).await }
            });
            pending.push((path, task));
        }
    }

    let attempted = pending.len();
    let (paths, tasks): (Vec<_>, Vec<_>) = pending.into_iter().unzip();

    let mut failures = Vec::new();
    for (path, joined) in paths.into_iter().zip(future::join_all(tasks).await) {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(err)) => failures.push(FailedDelete { path, error: err }),
            Err(join_err) => failures.push(FailedDelete {
                path,
                error: Error::Internal(anyhow::anyhow!("deletion task aborted: {join_err}")),
            }),
        }
    }

    if let Some(err) = listing_error {
        for failure in &failures {
            tracing::warn!(
                path = %failure.path,
                error = %failure.error,
                "object deletion failed during aborted subtree removal"
            );
        }
        return Err(err);
    }

    if failures.is_empty() {
        tracing::debug!(root = %root, deleted = attempted, "subtree removal complete");
        Ok(())
    } else {
        Err(Error::SubtreeIncomplete {
            root,
            attempted,
            failures,
        })
    }
}
