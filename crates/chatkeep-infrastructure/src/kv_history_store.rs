//! `HistoryStore` implementation over any `KeyValueBackend`.

use async_trait::async_trait;
use chatkeep_core::history::{HistoryStore, KeyValueBackend};
use chatkeep_core::identity::StableConversationKey;
use chatkeep_core::message::StoredMessage;
use chatkeep_core::{ChatkeepError, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Prefix separating history entries from anything else sharing the backend.
const KEY_PREFIX: &str = "history/";

/// History store keeping each conversation as one JSON array value.
///
/// Backend keys are `history/` followed by the JSON pair
/// `["<display_name>","<alias>"]`, so names containing the rendered-key
/// separator still map to distinct entries.
///
/// Appends are read-modify-write against the backend, serialized per key
/// by an async mutex. Different keys never wait on each other.
pub struct KvHistoryStore<B: KeyValueBackend> {
    backend: B,
    /// Only holds entries for appends in flight.
    key_locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl<B: KeyValueBackend> KvHistoryStore<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            key_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn backend_key(key: &StableConversationKey) -> Result<String> {
        let pair = serde_json::to_string(&(key.display_name(), key.alias()))?;
        Ok(format!("{}{}", KEY_PREFIX, pair))
    }

    fn decode_key(backend_key: &str) -> Option<StableConversationKey> {
        let pair = backend_key.strip_prefix(KEY_PREFIX)?;
        match serde_json::from_str::<(String, String)>(pair) {
            Ok((display_name, alias)) => Some(StableConversationKey::new(display_name, alias)),
            Err(e) => {
                tracing::warn!(
                    "[KvHistoryStore] Ignoring malformed history key '{}': {}",
                    backend_key,
                    e
                );
                None
            }
        }
    }

    fn lock_for(&self, backend_key: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self
            .key_locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        locks
            .entry(backend_key.to_string())
            .or_default()
            .clone()
    }

    /// Drops the per-key lock once no other append holds or waits on it.
    fn release_lock(&self, backend_key: &str, lock: Arc<tokio::sync::Mutex<()>>) {
        let mut locks = self
            .key_locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        // One count for the map, one for `lock`
        if Arc::strong_count(&lock) == 2 {
            locks.remove(backend_key);
        }
    }

    async fn append_locked(&self, backend_key: &str, message: StoredMessage) -> Result<usize> {
        let mut history = self.load(backend_key).await?;
        history.push(message);
        let len = history.len();

        self.backend
            .set(backend_key, serde_json::to_value(history)?)
            .await?;
        Ok(len)
    }

    async fn load(&self, backend_key: &str) -> Result<Vec<StoredMessage>> {
        match self.backend.get(backend_key).await? {
            None => Ok(Vec::new()),
            Some(Value::Array(items)) => items
                .into_iter()
                .map(|item| serde_json::from_value(item).map_err(ChatkeepError::from))
                .collect(),
            Some(other) => Err(ChatkeepError::data_access(format!(
                "History entry '{}' is not a list (found {})",
                backend_key,
                value_kind(&other)
            ))),
        }
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[async_trait]
impl<B: KeyValueBackend> HistoryStore for KvHistoryStore<B> {
    async fn append(&self, key: &StableConversationKey, message: StoredMessage) -> Result<()> {
        let backend_key = Self::backend_key(key)?;
        let lock = self.lock_for(&backend_key);
        let result = {
            let _guard = lock.lock().await;
            self.append_locked(&backend_key, message).await
        };
        self.release_lock(&backend_key, lock);
        let len = result?;

        tracing::debug!(
            "[KvHistoryStore] Appended to '{}' (now {} messages)",
            key,
            len
        );
        Ok(())
    }

    async fn read(&self, key: &StableConversationKey) -> Result<Vec<StoredMessage>> {
        let backend_key = Self::backend_key(key)?;
        let history = self.load(&backend_key).await?;

        tracing::debug!(
            "[KvHistoryStore] Read {} messages for '{}'",
            history.len(),
            key
        );
        Ok(history)
    }

    async fn conversations(&self) -> Result<Vec<StableConversationKey>> {
        let keys = self.backend.keys().await?;
        let mut conversations: Vec<StableConversationKey> = keys
            .iter()
            .filter(|key| key.starts_with(KEY_PREFIX))
            .filter_map(|key| Self::decode_key(key))
            .collect();
        conversations.sort();
        Ok(conversations)
    }
}
