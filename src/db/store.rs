//! Transaction seam over the document store.

use crate::error::Result;
use async_trait::async_trait;
use serde_json::Value;

/// A store capable of transactional read-modify-write on single documents.
///
/// Implementations must provide snapshot isolation per transaction: a commit
/// fails with a conflict when a document read inside the transaction was
/// modified by another writer in the meantime. Conflict retrying, if any, is
/// the store's own concern, not the caller's.
#[async_trait]
pub trait TransactionalStore: Clone + Send + Sync + 'static {
    /// One in-flight transaction attempt.
    type Tx<'a>: DocumentTransaction + 'a
    where
        Self: 'a;

    /// Begin a transaction.
    async fn begin<'a>(&'a self) -> Result<Self::Tx<'a>>;
}

/// One in-flight transaction attempt.
///
/// Reads are transaction-consistent. Writes are staged and take effect only
/// on a successful [`commit`](Self::commit). Implementations stamp every
/// written document's `updated_at` field with the store's server-assigned
/// write time.
#[async_trait]
pub trait DocumentTransaction: Send {
    /// Read one document, or `None` if it does not exist.
    async fn get(&mut self, collection: &str, document_id: &str) -> Result<Option<Value>>;

    /// Stage creation of a document the transaction observed as absent.
    ///
    /// Stores whose write primitive is an upsert may stage this identically
    /// to [`update`](Self::update); stores with first-class create semantics
    /// should enforce the observed absence at commit.
    fn create(&mut self, collection: &str, document_id: &str, state: Value) -> Result<()>;

    /// Stage an update of an existing document.
    fn update(&mut self, collection: &str, document_id: &str, state: Value) -> Result<()>;

    /// Commit all staged writes.
    async fn commit(self) -> Result<()>;

    /// Abandon the transaction without writing.
    async fn rollback(self) -> Result<()>;
}
