// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore-backed document store.
//!
//! Provides:
//! - Connection handling (including the emulator unauthenticated path)
//! - Collection CRUD pass-throughs
//! - The transaction primitive consumed by locked updates

use crate::db::store::{DocumentTransaction, TransactionalStore};
use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

/// Field stamped with the server-assigned write time on every transactional
/// write.
const UPDATED_AT_FIELD: &str = "updated_at";

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreStore {
    client: firestore::FirestoreDb,
}

impl FirestoreStore {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self> {
        // If the emulator environment variable is set, use unauthenticated
        // connection to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| Error::Store(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self { client })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| Error::Store(format!("Failed to connect to Firestore Emulator: {}", e)))?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self { client })
    }

    // ─── Collection CRUD ─────────────────────────────────────────

    /// List every document in a collection.
    pub async fn list_docs<T>(&self, collection: &str) -> Result<Vec<T>>
    where
        T: DeserializeOwned + Send,
    {
        self.client
            .fluent()
            .select()
            .from(collection)
            .obj()
            .query()
            .await
            .map_err(|e| Error::Store(e.to_string()))
    }

    /// Get a document by id, or `None` if absent.
    pub async fn get_doc<T>(&self, collection: &str, document_id: &str) -> Result<Option<T>>
    where
        T: DeserializeOwned + Send,
    {
        self.client
            .fluent()
            .select()
            .by_id_in(collection)
            .obj()
            .one(document_id)
            .await
            .map_err(|e| Error::Store(e.to_string()))
    }

    /// Create a document with a generated id, returning the new id.
    pub async fn create_doc<T>(&self, collection: &str, doc: &T) -> Result<String>
    where
        T: Serialize + Sync + Send + DeserializeOwned,
    {
        #[derive(serde::Deserialize)]
        struct Created {
            #[serde(alias = "_firestore_id")]
            id: String,
        }

        let created: Created = self
            .client
            .fluent()
            .insert()
            .into(collection)
            .generate_document_id()
            .object(doc)
            .execute()
            .await
            .map_err(|e| Error::Store(e.to_string()))?;

        Ok(created.id)
    }

    /// Create or replace a document under an explicit id.
    pub async fn set_doc<T>(&self, collection: &str, document_id: &str, doc: &T) -> Result<()>
    where
        T: Serialize + Sync + Send + DeserializeOwned,
    {
        let _: () = self
            .client
            .fluent()
            .update()
            .in_col(collection)
            .document_id(document_id)
            .object(doc)
            .execute()
            .await
            .map_err(|e| Error::Store(e.to_string()))?;
        Ok(())
    }

    /// Delete a document.
    pub async fn delete_doc(&self, collection: &str, document_id: &str) -> Result<()> {
        self.client
            .fluent()
            .delete()
            .from(collection)
            .document_id(document_id)
            .execute()
            .await
            .map_err(|e| Error::Store(e.to_string()))?;
        Ok(())
    }
}

/// One Firestore transaction attempt.
pub struct FirestoreTx<'a> {
    db: &'a firestore::FirestoreDb,
    tx: firestore::FirestoreTransaction<'a>,
}

impl<'a> FirestoreTx<'a> {
    /// Stage a write through the fluent update builder, stamping the
    /// server-assigned write time.
    ///
    /// Firestore's update write is an upsert, so the same staging covers
    /// both the create and the update branch; the transactional read's
    /// conflict detection already guards the observed existence.
    fn stage_write(&mut self, collection: &str, document_id: &str, state: &Value) -> Result<()> {
        self.db
            .fluent()
            .update()
            .in_col(collection)
            .document_id(document_id)
            .object(state)
            .transforms(|t| {
                t.fields([t
                    .field(UPDATED_AT_FIELD)
                    .server_value(firestore::FirestoreTransformServerValue::RequestTime)])
            })
            .add_to_transaction(&mut self.tx)
            .map_err(|e| Error::Store(format!("Failed to add write to transaction: {}", e)))?;
        Ok(())
    }
}

#[async_trait]
impl TransactionalStore for FirestoreStore {
    type Tx<'a>
        = FirestoreTx<'a>
    where
        Self: 'a;

    async fn begin<'a>(&'a self) -> Result<FirestoreTx<'a>> {
        let tx = self
            .client
            .begin_transaction()
            .await
            .map_err(|e| Error::Store(format!("Failed to begin transaction: {}", e)))?;

        Ok(FirestoreTx {
            db: &self.client,
            tx,
        })
    }
}

#[async_trait]
impl<'a> DocumentTransaction for FirestoreTx<'a> {
    async fn get(&mut self, collection: &str, document_id: &str) -> Result<Option<Value>> {
        // Read through the transaction's consistency selector so the commit
        // is conditioned on this snapshot.
        let tx_db = self
            .db
            .clone_with_consistency_selector(firestore::FirestoreConsistencySelector::Transaction(
                self.tx.transaction_id().clone(),
            ));

        tx_db
            .fluent()
            .select()
            .by_id_in(collection)
            .obj()
            .one(document_id)
            .await
            .map_err(|e| Error::Store(e.to_string()))
    }

    fn create(&mut self, collection: &str, document_id: &str, state: Value) -> Result<()> {
        self.stage_write(collection, document_id, &state)
    }

    fn update(&mut self, collection: &str, document_id: &str, state: Value) -> Result<()> {
        self.stage_write(collection, document_id, &state)
    }

    async fn commit(self) -> Result<()> {
        self.tx.commit().await.map_err(map_store_error)?;
        Ok(())
    }

    async fn rollback(self) -> Result<()> {
        self.tx
            .rollback()
            .await
            .map_err(|e| Error::Store(format!("Failed to roll back transaction: {}", e)))
    }
}

/// Map a Firestore error, surfacing commit conflicts as their own variant.
fn map_store_error(err: firestore::errors::FirestoreError) -> Error {
    use firestore::errors::FirestoreError;
    match err {
        FirestoreError::DataConflictError(e) => Error::TransactionConflict(e.to_string()),
        other => Error::Store(other.to_string()),
    }
}
