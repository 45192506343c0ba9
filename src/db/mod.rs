//! Document store layer (Firestore).

pub mod firestore;
pub mod store;
pub mod update;

pub use firestore::FirestoreStore;
pub use store::{DocumentTransaction, TransactionalStore};
pub use update::{locked_update, UpdateOptions, DEFAULT_UPDATE_TIMEOUT};
