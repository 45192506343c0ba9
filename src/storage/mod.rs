//! Blob storage layer.
//!
//! Objects live in a flat, prefix-addressed namespace; "folders" are
//! synthetic, inferred from path prefixes by listing, and disappear with
//! their last object.

pub mod firebase;
pub mod gzip;
pub mod remove;

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use firebase::FirebaseStorageClient;
pub use gzip::{compress, decompress};
pub use remove::remove_subtree;

/// A file or folder entry returned by a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageNode {
    /// Last path segment
    pub name: String,
    /// Full path from the bucket root
    pub path: String,
}

impl StorageNode {
    /// Node from a full path; the name is the last segment.
    pub fn from_path(path: impl Into<String>) -> Self {
        let path = path.into();
        let name = path.rsplit('/').next().unwrap_or_default().to_string();
        Self { name, path }
    }
}

/// One level of a listing: direct child objects and nested prefixes.
#[derive(Debug, Clone, Default)]
pub struct Listing {
    pub objects: Vec<StorageNode>,
    pub sub_prefixes: Vec<StorageNode>,
}

/// The blob store collaborator.
#[async_trait]
pub trait BlobStore: Clone + Send + Sync + 'static {
    /// List the immediate children of a prefix.
    async fn list(&self, prefix: &str) -> Result<Listing>;

    /// Delete one object. Prefixes are not objects and cannot be deleted.
    async fn delete(&self, object_path: &str) -> Result<()>;
}
