// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared test doubles for the three backend collaborators.

use async_trait::async_trait;
use firekit::auth::{IdentityCredential, IdentityProvider, ProviderUser, Session, TokenPair};
use firekit::db::{DocumentTransaction, TransactionalStore};
use firekit::error::{Error, Result};
use firekit::storage::{BlobStore, Listing, StorageNode};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Check if the identity provider emulator is available.
#[allow(dead_code)]
pub fn auth_emulator_available() -> bool {
    std::env::var("FIREBASE_AUTH_EMULATOR_HOST").is_ok()
}

/// Skip test with message if the auth emulator is not available.
#[macro_export]
macro_rules! require_auth_emulator {
    () => {
        if !crate::common::auth_emulator_available() {
            eprintln!("⚠️  Skipping: FIREBASE_AUTH_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Check if the storage emulator is available.
#[allow(dead_code)]
pub fn storage_emulator_available() -> bool {
    std::env::var("FIREBASE_STORAGE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if the storage emulator is not available.
#[macro_export]
macro_rules! require_storage_emulator {
    () => {
        if !crate::common::storage_emulator_available() {
            eprintln!("⚠️  Skipping: FIREBASE_STORAGE_EMULATOR_HOST not set");
            return;
        }
    };
}

// ─── Identity provider mock ──────────────────────────────────────

/// Scripted identity provider.
///
/// Outcomes are popped from per-operation queues; an empty exchange queue
/// rejects, an empty refresh queue succeeds with a generated token, so the
/// "always rejected exchange, always successful refresh" scenario needs no
/// scripting at all.
#[derive(Default)]
#[allow(dead_code)]
pub struct MockProvider {
    exchange_results: Mutex<VecDeque<Result<Session>>>,
    refresh_results: Mutex<VecDeque<Result<TokenPair>>>,
    force_refresh_results: Mutex<VecDeque<Result<String>>>,
    pub exchange_calls: AtomicUsize,
    pub refresh_calls: AtomicUsize,
    /// Id tokens seen by the exchange endpoint, in order.
    pub exchanged_with: Mutex<Vec<String>>,
    /// Refresh tokens seen by the refresh endpoint, in order.
    pub refreshed_with: Mutex<Vec<String>>,
}

#[allow(dead_code)]
impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_exchange(&self, result: Result<Session>) {
        self.exchange_results.lock().unwrap().push_back(result);
    }

    pub fn push_refresh(&self, result: Result<TokenPair>) {
        self.refresh_results.lock().unwrap().push_back(result);
    }

    pub fn push_force_refresh(&self, result: Result<String>) {
        self.force_refresh_results.lock().unwrap().push_back(result);
    }
}

#[async_trait]
impl IdentityProvider for MockProvider {
    async fn exchange_credential(&self, credential: &IdentityCredential) -> Result<Session> {
        self.exchange_calls.fetch_add(1, Ordering::SeqCst);
        self.exchanged_with
            .lock()
            .unwrap()
            .push(credential.id_token.clone());

        match self.exchange_results.lock().unwrap().pop_front() {
            Some(result) => result,
            None => Err(Error::ProviderRejected("token refused".to_string())),
        }
    }

    async fn refresh_id_token(&self, refresh_token: &str) -> Result<TokenPair> {
        let n = self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        self.refreshed_with
            .lock()
            .unwrap()
            .push(refresh_token.to_string());

        match self.refresh_results.lock().unwrap().pop_front() {
            Some(result) => result,
            None => Ok(TokenPair {
                id_token: format!("fresh-id-{}", n),
                refresh_token: None,
            }),
        }
    }

    async fn current_user(&self) -> Result<Option<ProviderUser>> {
        Ok(None)
    }

    async fn force_token_refresh(&self, _user: &ProviderUser) -> Result<String> {
        match self.force_refresh_results.lock().unwrap().pop_front() {
            Some(result) => result,
            None => Ok("forced-fresh-token".to_string()),
        }
    }
}

/// A session as the provider would mint it.
#[allow(dead_code)]
pub fn test_session(uid: &str, email: Option<&str>, name: Option<&str>) -> Session {
    Session {
        user: ProviderUser {
            uid: uid.to_string(),
            email: email.map(str::to_string),
            display_name: name.map(str::to_string),
            refresh_token: Some("session-refresh-token".to_string()),
        },
        id_token: "session-id-token".to_string(),
        refresh_token: Some("session-refresh-token".to_string()),
    }
}

// ─── Document store mock ─────────────────────────────────────────

/// Marker value the mock store stamps as the server-assigned write time.
#[allow(dead_code)]
pub const SERVER_TIME: &str = "server-time";

/// In-memory transactional document store.
#[derive(Clone, Default)]
#[allow(dead_code)]
pub struct MockDocStore {
    docs: Arc<Mutex<HashMap<(String, String), Value>>>,
    commit_delay: Arc<Mutex<Duration>>,
    commit_failures: Arc<Mutex<VecDeque<Error>>>,
}

#[allow(dead_code)]
impl MockDocStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, collection: &str, document_id: &str, state: Value) {
        self.docs
            .lock()
            .unwrap()
            .insert((collection.to_string(), document_id.to_string()), state);
    }

    pub fn doc(&self, collection: &str, document_id: &str) -> Option<Value> {
        self.docs
            .lock()
            .unwrap()
            .get(&(collection.to_string(), document_id.to_string()))
            .cloned()
    }

    /// Make every commit take this long before settling.
    pub fn set_commit_delay(&self, delay: Duration) {
        *self.commit_delay.lock().unwrap() = delay;
    }

    /// Fail the next commit with the given error.
    pub fn push_commit_failure(&self, error: Error) {
        self.commit_failures.lock().unwrap().push_back(error);
    }
}

#[allow(dead_code)]
pub struct MockTx {
    docs: Arc<Mutex<HashMap<(String, String), Value>>>,
    staged: Vec<(String, String, Value, bool)>,
    delay: Duration,
    failure: Option<Error>,
}

#[async_trait]
impl TransactionalStore for MockDocStore {
    type Tx<'a>
        = MockTx
    where
        Self: 'a;

    async fn begin<'a>(&'a self) -> Result<MockTx> {
        Ok(MockTx {
            docs: self.docs.clone(),
            staged: Vec::new(),
            delay: *self.commit_delay.lock().unwrap(),
            failure: self.commit_failures.lock().unwrap().pop_front(),
        })
    }
}

#[async_trait]
impl DocumentTransaction for MockTx {
    async fn get(&mut self, collection: &str, document_id: &str) -> Result<Option<Value>> {
        Ok(self
            .docs
            .lock()
            .unwrap()
            .get(&(collection.to_string(), document_id.to_string()))
            .cloned())
    }

    fn create(&mut self, collection: &str, document_id: &str, state: Value) -> Result<()> {
        self.staged
            .push((collection.to_string(), document_id.to_string(), state, true));
        Ok(())
    }

    fn update(&mut self, collection: &str, document_id: &str, state: Value) -> Result<()> {
        self.staged
            .push((collection.to_string(), document_id.to_string(), state, false));
        Ok(())
    }

    async fn commit(self) -> Result<()> {
        tokio::time::sleep(self.delay).await;

        if let Some(error) = self.failure {
            return Err(error);
        }

        let mut docs = self.docs.lock().unwrap();
        for (collection, document_id, mut state, is_create) in self.staged {
            let key = (collection, document_id);
            if is_create && docs.contains_key(&key) {
                return Err(Error::TransactionConflict(format!(
                    "document {}/{} already exists",
                    key.0, key.1
                )));
            }
            if let Some(map) = state.as_object_mut() {
                map.insert("updated_at".to_string(), Value::String(SERVER_TIME.into()));
            }
            docs.insert(key, state);
        }
        Ok(())
    }

    async fn rollback(self) -> Result<()> {
        Ok(())
    }
}

// ─── Blob store mock ─────────────────────────────────────────────

/// In-memory blob store with synthetic folders inferred from object paths.
#[derive(Clone, Default)]
#[allow(dead_code)]
pub struct MockBlobStore {
    objects: Arc<Mutex<BTreeMap<String, Vec<u8>>>>,
    fail_paths: Arc<Mutex<HashSet<String>>>,
    pub delete_calls: Arc<AtomicUsize>,
    pub list_calls: Arc<AtomicUsize>,
}

#[allow(dead_code)]
impl MockBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, path: &str, bytes: &[u8]) {
        self.objects
            .lock()
            .unwrap()
            .insert(path.to_string(), bytes.to_vec());
    }

    pub fn contains(&self, path: &str) -> bool {
        self.objects.lock().unwrap().contains_key(path)
    }

    pub fn object_count(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    /// Make deletion of this path fail as if the object had already vanished.
    pub fn fail_delete(&self, path: &str) {
        self.fail_paths.lock().unwrap().insert(path.to_string());
    }
}

#[async_trait]
impl BlobStore for MockBlobStore {
    async fn list(&self, prefix: &str) -> Result<Listing> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);

        let base = match prefix.trim_matches('/') {
            "" => String::new(),
            trimmed => format!("{}/", trimmed),
        };

        let objects_map = self.objects.lock().unwrap();
        let mut objects = Vec::new();
        let mut sub_prefixes = BTreeSet::new();

        for key in objects_map.keys() {
            let Some(rest) = key.strip_prefix(&base) else {
                continue;
            };
            match rest.split_once('/') {
                Some((segment, _)) => {
                    sub_prefixes.insert(format!("{}{}", base, segment));
                }
                None => objects.push(StorageNode::from_path(key.clone())),
            }
        }

        Ok(Listing {
            objects,
            sub_prefixes: sub_prefixes
                .into_iter()
                .map(StorageNode::from_path)
                .collect(),
        })
    }

    async fn delete(&self, object_path: &str) -> Result<()> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);

        if self.fail_paths.lock().unwrap().contains(object_path) {
            return Err(Error::ObjectNotFound(object_path.to_string()));
        }

        let mut objects = self.objects.lock().unwrap();
        if objects.remove(object_path).is_some() {
            return Ok(());
        }

        let as_prefix = format!("{}/", object_path.trim_end_matches('/'));
        if objects.keys().any(|key| key.starts_with(&as_prefix)) {
            return Err(Error::CannotDeletePrefix(object_path.to_string()));
        }

        Err(Error::ObjectNotFound(object_path.to_string()))
    }
}
