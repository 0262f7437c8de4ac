//! Plain-data message record owned by the history store.

use super::fields;
use super::live::LiveMessage;
use crate::identity::StableConversationKey;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A sanitized copy of a host message.
///
/// Holds plain JSON data only, so it can be handed to any key-value
/// backend. It never aliases the host's live record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoredMessage {
    fields: Map<String, Value>,
}

impl StoredMessage {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(name.into(), value.into());
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.fields.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Stable identity of the peer embedded at append time.
    ///
    /// Returns `None` if the record carries no display name (it was never
    /// stamped, or the stored data was edited by hand).
    pub fn peer_key(&self) -> Option<StableConversationKey> {
        let display_name = self.get_str(fields::PEER_DISPLAY_NAME)?;
        let alias = self.get_str(fields::PEER_ALIAS).unwrap_or_default();
        Some(StableConversationKey::new(display_name, alias))
    }

    /// Converts into a live record for installation into the host buffer.
    pub fn into_live(self) -> LiveMessage {
        LiveMessage::from(self.fields)
    }
}

impl From<Map<String, Value>> for StoredMessage {
    fn from(fields: Map<String, Value>) -> Self {
        Self::new(fields)
    }
}
