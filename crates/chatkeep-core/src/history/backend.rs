//! Key-value backend trait.

use crate::error::Result;
use async_trait::async_trait;
use serde_json::Value;

/// A process-local key-value store over serializable values.
///
/// Operations on a single key are atomic with respect to that key. The
/// backend knows nothing about conversations or messages; it is the
/// swappable seam between chatkeep and whatever storage the host offers.
#[async_trait]
pub trait KeyValueBackend: Send + Sync {
    /// Reads the value stored under `key`.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(value))`: Key present
    /// - `Ok(None)`: Key never written
    /// - `Err(_)`: Backend unavailable or data unreadable
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Replaces the value stored under `key`.
    async fn set(&self, key: &str, value: Value) -> Result<()>;

    /// Lists every key currently stored.
    async fn keys(&self) -> Result<Vec<String>>;
}
