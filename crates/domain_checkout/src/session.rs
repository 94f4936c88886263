//! In-memory transient store
//!
//! Holds the draft application and payment info between the form submission
//! and the bank's return callback. Sessions expire after an idle TTL; expired
//! sessions are dropped lazily whenever the store is touched.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::RwLock;

use core_kernel::{DomainPort, SessionId};

use crate::error::CheckoutError;
use crate::ports::TransientStore;

/// Draft policy application written by the form step
pub const DRAFT_KEY: &str = "policy_draft";
/// Customer payment info written by the form step
pub const CUSTOMER_KEY: &str = "customer_payment";
/// Record whose persistence failed during the return callback
pub const PENDING_RECORD_KEY: &str = "pending_record";

#[derive(Debug)]
struct Session {
    values: HashMap<String, Value>,
    touched: Instant,
}

#[derive(Debug)]
pub struct InMemoryTransientStore {
    sessions: RwLock<HashMap<SessionId, Session>>,
    ttl: Duration,
}

impl InMemoryTransientStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Number of live sessions
    pub async fn session_count(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        self.purge_expired(&mut sessions);
        sessions.len()
    }

    fn purge_expired(&self, sessions: &mut HashMap<SessionId, Session>) {
        let ttl = self.ttl;
        sessions.retain(|_, s| s.touched.elapsed() < ttl);
    }
}

impl Default for InMemoryTransientStore {
    fn default() -> Self {
        Self::new(Duration::from_secs(30 * 60))
    }
}

impl DomainPort for InMemoryTransientStore {}

#[async_trait]
impl TransientStore for InMemoryTransientStore {
    async fn put(&self, session: SessionId, key: &str, value: Value) {
        let mut sessions = self.sessions.write().await;
        self.purge_expired(&mut sessions);
        let entry = sessions.entry(session).or_insert_with(|| Session {
            values: HashMap::new(),
            touched: Instant::now(),
        });
        entry.touched = Instant::now();
        entry.values.insert(key.to_string(), value);
    }

    async fn get(&self, session: SessionId, key: &str) -> Option<Value> {
        let mut sessions = self.sessions.write().await;
        self.purge_expired(&mut sessions);
        let entry = sessions.get_mut(&session)?;
        entry.touched = Instant::now();
        entry.values.get(key).cloned()
    }

    async fn remove(&self, session: SessionId, key: &str) -> Option<Value> {
        let mut sessions = self.sessions.write().await;
        self.purge_expired(&mut sessions);
        let entry = sessions.get_mut(&session)?;
        let removed = entry.values.remove(key);
        if entry.values.is_empty() {
            sessions.remove(&session);
        }
        removed
    }

    async fn keys(&self, session: SessionId) -> Vec<String> {
        let mut sessions = self.sessions.write().await;
        self.purge_expired(&mut sessions);
        let mut keys: Vec<String> = sessions
            .get(&session)
            .map(|s| s.values.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        keys
    }
}

/// Serializes and stores a typed value
pub async fn put_json<T: Serialize>(
    store: &dyn TransientStore,
    session: SessionId,
    key: &str,
    value: &T,
) -> Result<(), CheckoutError> {
    let json = serde_json::to_value(value).map_err(|e| CheckoutError::CorruptSession(e.to_string()))?;
    store.put(session, key, json).await;
    Ok(())
}

/// Reads a typed value; `Ok(None)` when the key is absent
pub async fn get_json<T: DeserializeOwned>(
    store: &dyn TransientStore,
    session: SessionId,
    key: &str,
) -> Result<Option<T>, CheckoutError> {
    match store.get(session, key).await {
        Some(value) => serde_json::from_value(value)
            .map(Some)
            .map_err(|e| CheckoutError::CorruptSession(format!("{key}: {e}"))),
        None => Ok(None),
    }
}
