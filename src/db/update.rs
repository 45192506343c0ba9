// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Optimistic locked updates against single documents.

use crate::db::store::{DocumentTransaction, TransactionalStore};
use crate::error::{Error, Result};
use serde_json::{Map, Value};
use std::future::Future;
use std::time::Duration;
use tokio::time;

/// Deadline applied to a locked update when the caller does not pick one.
pub const DEFAULT_UPDATE_TIMEOUT: Duration = Duration::from_millis(15_000);

/// Options for [`locked_update`].
#[derive(Debug, Clone)]
pub struct UpdateOptions {
    /// Wall-clock deadline for the whole read-modify-write.
    pub timeout: Duration,
    /// Treat a missing document as an empty one instead of failing.
    pub create_if_missing: bool,
}

impl Default for UpdateOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_UPDATE_TIMEOUT,
            create_if_missing: false,
        }
    }
}

/// Transactional read-modify-write of one document under a deadline.
///
/// The transform receives the current document state (an empty object when
/// the document is absent and `create_if_missing` is set) and returns the
/// next state. It may await reads of its own but must not write, and must
/// not assume the commit will succeed. The write lands in the same
/// transaction as the read, so a concurrent writer on the same document
/// forces a conflict instead of a lost update.
///
/// Known limitation: losing the deadline race does not cancel the in-flight
/// transaction, because the store runtime has no cooperative cancellation.
/// The attempt is detached and may still commit afterwards; a background
/// task logs its eventual outcome.
pub async fn locked_update<S, F, Fut>(
    store: &S,
    collection: &str,
    document_id: &str,
    transform: F,
    options: UpdateOptions,
) -> Result<()>
where
    S: TransactionalStore,
    F: FnOnce(Value) -> Fut + Send + 'static,
    Fut: Future<Output = Result<Value>> + Send + 'static,
{
    let mut attempt = tokio::spawn(run_attempt(
        store.clone(),
        collection.to_string(),
        document_id.to_string(),
        transform,
        options.create_if_missing,
    ));

    match time::timeout(options.timeout, &mut attempt).await {
        Ok(joined) => joined
            .map_err(|err| Error::Internal(anyhow::anyhow!("locked update task aborted: {err}")))?,
        Err(_elapsed) => {
            let collection = collection.to_string();
            let document_id = document_id.to_string();
            tokio::spawn(async move {
                match attempt.await {
                    Ok(Ok(())) => tracing::warn!(
                        collection = %collection,
                        document_id = %document_id,
                        "locked update committed after its deadline"
                    ),
                    Ok(Err(err)) => tracing::warn!(
                        collection = %collection,
                        document_id = %document_id,
                        error = %err,
                        "abandoned locked update failed"
                    ),
                    Err(err) => tracing::error!(
                        collection = %collection,
                        document_id = %document_id,
                        error = %err,
                        "abandoned locked update task aborted"
                    ),
                }
            });
            Err(Error::UpdateTimedOut(options.timeout))
        }
    }
}

/// One transaction attempt: read, transform, write, commit.
async fn run_attempt<S, F, Fut>(
    store: S,
    collection: String,
    document_id: String,
    transform: F,
    create_if_missing: bool,
) -> Result<()>
where
    S: TransactionalStore,
    F: FnOnce(Value) -> Fut + Send,
    Fut: Future<Output = Result<Value>> + Send,
{
    let mut tx = store.begin().await?;

    let (existed, base) = match tx.get(&collection, &document_id).await? {
        Some(state) => (true, state),
        None if create_if_missing => (false, Value::Object(Map::new())),
        None => {
            let _ = tx.rollback().await;
            return Err(Error::DocumentMissing(document_id));
        }
    };

    let next = transform(base).await?;

    if existed {
        tx.update(&collection, &document_id, next)?;
    } else {
        tx.create(&collection, &document_id, next)?;
    }

    tx.commit().await
}
