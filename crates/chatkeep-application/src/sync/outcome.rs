//! Outcomes reported by the controller instead of errors.

use chatkeep_core::identity::StableConversationKey;

/// Result of handling one `message-appended` event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppendOutcome {
    /// Sanitized copy queued for the store; success is reported later.
    Queued {
        key: StableConversationKey,
        stripped: Vec<String>,
    },
    /// The message names no peer.
    MissingPeer,
    /// The peer is not in the current session's directory.
    UnknownPeer(String),
    /// The writer task is gone (runtime shutting down).
    WriterClosed,
}

/// Result of one restore attempt for a conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoreOutcome {
    /// History installed into the live buffer.
    Installed { restored: usize, dropped: usize },
    /// Live buffer already had messages; host-fresh data wins.
    SkippedLiveBuffer,
    /// Another restore for the same conversation is in flight.
    AlreadyRestoring,
    /// Nothing stored, or nothing resolvable, for this conversation.
    NothingToRestore { dropped: usize },
    /// The conversation id is not in the current session's directory.
    UnknownConversation,
    /// A new session started while the read was in flight.
    Stale,
    /// The store could not be read.
    Failed(String),
    /// No conversation was open when the debounce window elapsed.
    NoConversation,
}
