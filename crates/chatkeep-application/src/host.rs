//! Boundary with the host chat client.
//!
//! The host owns its live conversation buffers and delivers lifecycle
//! events; chatkeep reads buffer emptiness and performs one atomic
//! installation per restore, nothing else.

use async_trait::async_trait;
use chatkeep_core::contact::SessionContext;
use chatkeep_core::message::LiveMessage;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Lifecycle events delivered by the host.
#[derive(Debug, Clone)]
pub enum HostEvent {
    /// A new login produced a fresh contact directory.
    SessionStarted(SessionContext),
    /// A message was added to some conversation's live buffer.
    MessageAppended(LiveMessage),
    /// The user opened the conversation with this ephemeral id.
    ConversationSelected(String),
    /// The host re-rendered conversation content; carries the currently
    /// open conversation, if any. Arrives in bursts.
    ConversationChanged(Option<String>),
}

/// The host's live conversation buffers, keyed by ephemeral id.
#[async_trait]
pub trait LiveConversationBuffer: Send + Sync {
    /// Returns true if the host already holds messages for `conversation`.
    async fn has_messages(&self, conversation: &str) -> bool;

    /// Installs `messages` as the whole buffer for `conversation` in one
    /// assignment, but only if the buffer is still empty.
    ///
    /// Returns false, leaving the buffer untouched, when the host populated
    /// it in the meantime.
    async fn install_if_empty(&self, conversation: &str, messages: Vec<LiveMessage>) -> bool;
}

/// Simple in-process buffer, for hosts without their own store and for tests.
#[derive(Debug, Default)]
pub struct InMemoryLiveBuffer {
    conversations: RwLock<HashMap<String, Vec<LiveMessage>>>,
}

impl InMemoryLiveBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a host-fresh message to a conversation.
    pub async fn push(&self, conversation: &str, message: LiveMessage) {
        let mut conversations = self.conversations.write().await;
        conversations
            .entry(conversation.to_string())
            .or_default()
            .push(message);
    }

    /// Returns a copy of a conversation's buffer.
    pub async fn messages(&self, conversation: &str) -> Vec<LiveMessage> {
        let conversations = self.conversations.read().await;
        conversations.get(conversation).cloned().unwrap_or_default()
    }

    /// Drops everything, as the host does on logout.
    pub async fn clear(&self) {
        self.conversations.write().await.clear();
    }
}

#[async_trait]
impl LiveConversationBuffer for InMemoryLiveBuffer {
    async fn has_messages(&self, conversation: &str) -> bool {
        let conversations = self.conversations.read().await;
        conversations
            .get(conversation)
            .is_some_and(|messages| !messages.is_empty())
    }

    async fn install_if_empty(&self, conversation: &str, messages: Vec<LiveMessage>) -> bool {
        let mut conversations = self.conversations.write().await;
        let slot = conversations.entry(conversation.to_string()).or_default();
        if !slot.is_empty() {
            return false;
        }
        *slot = messages;
        true
    }
}
