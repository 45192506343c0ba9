// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Error types shared by the session, update and storage components.

use std::time::Duration;

/// Crate error type covering all three backend collaborators.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("no usable credential supplied")]
    InvalidInput,

    #[error("identity provider rejected the credential: {0}")]
    ProviderRejected(String),

    #[error("token refresh failed")]
    RefreshFailed(#[source] anyhow::Error),

    #[error("sign-in retries exhausted")]
    SignInExhausted(#[source] Box<Error>),

    #[error("incomplete profile: {0}")]
    IncompleteProfile(&'static str),

    #[error("document not found: {0}")]
    DocumentMissing(String),

    #[error("locked update timed out after {0:?}")]
    UpdateTimedOut(Duration),

    #[error("transaction conflict: {0}")]
    TransactionConflict(String),

    #[error("document store error: {0}")]
    Store(String),

    #[error("object not found: {0}")]
    ObjectNotFound(String),

    #[error("cannot delete a prefix as an object: {0}")]
    CannotDeletePrefix(String),

    #[error("{} of {attempted} object deletions under '{root}' failed", .failures.len())]
    SubtreeIncomplete {
        root: String,
        attempted: usize,
        failures: Vec<FailedDelete>,
    },

    #[error("HTTP transport error: {0}")]
    Http(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl Error {
    /// Whether this error came back from the identity exchange itself
    /// (as opposed to transport or refresh plumbing).
    pub fn is_provider_rejection(&self) -> bool {
        matches!(self, Error::ProviderRejected(_))
    }

    /// The last underlying error of an exhausted sign-in, if that is what
    /// this is.
    pub fn exhaustion_cause(&self) -> Option<&Error> {
        match self {
            Error::SignInExhausted(cause) => Some(cause),
            _ => None,
        }
    }
}

/// One failed object deletion inside a subtree removal.
///
/// Collected rather than short-circuited; the aggregate is reported through
/// [`Error::SubtreeIncomplete`] once every sibling deletion has settled.
#[derive(Debug)]
pub struct FailedDelete {
    /// Full object path that could not be deleted.
    pub path: String,
    /// The per-object failure.
    pub error: Error,
}

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
