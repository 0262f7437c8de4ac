//! History store trait.

use crate::error::Result;
use crate::identity::StableConversationKey;
use crate::message::StoredMessage;
use async_trait::async_trait;

/// Append-oriented persistence of conversation histories.
///
/// Each [`StableConversationKey`] owns one insertion-ordered sequence that
/// is created on first append and only ever grows.
///
/// # Implementation Notes
///
/// Implementations should handle:
/// - Concurrent appends for different keys without interference
/// - Appends for the same key landing in call order
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Appends `message` to the end of the history for `key`.
    ///
    /// # Returns
    ///
    /// - `Ok(())`: Message durably written
    /// - `Err(_)`: Backend failure; nothing was written
    async fn append(&self, key: &StableConversationKey, message: StoredMessage) -> Result<()>;

    /// Reads every message appended for `key`, in append order.
    ///
    /// An unknown key yields an empty vector, never an error.
    async fn read(&self, key: &StableConversationKey) -> Result<Vec<StoredMessage>>;

    /// Lists the keys that have at least one stored message.
    async fn conversations(&self) -> Result<Vec<StableConversationKey>>;
}
