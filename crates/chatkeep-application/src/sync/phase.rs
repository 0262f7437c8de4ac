//! Per-conversation restore state.

use std::collections::HashMap;
use std::sync::Mutex;

/// Restore lifecycle of one conversation within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConversationPhase {
    #[default]
    Idle,
    Restoring,
    Live,
}

/// Tracks [`ConversationPhase`] per ephemeral id.
#[derive(Debug, Default)]
pub struct PhaseTracker {
    phases: Mutex<HashMap<String, ConversationPhase>>,
}

impl PhaseTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self, conversation: &str) -> ConversationPhase {
        let phases = self.phases.lock().unwrap_or_else(|e| e.into_inner());
        phases.get(conversation).copied().unwrap_or_default()
    }

    pub fn set(&self, conversation: &str, phase: ConversationPhase) {
        let mut phases = self.phases.lock().unwrap_or_else(|e| e.into_inner());
        phases.insert(conversation.to_string(), phase);
    }

    /// Moves a conversation into `Restoring`.
    ///
    /// Returns false if a restore is already in flight for it.
    pub fn begin_restore(&self, conversation: &str) -> bool {
        let mut phases = self.phases.lock().unwrap_or_else(|e| e.into_inner());
        let phase = phases.entry(conversation.to_string()).or_default();
        if *phase == ConversationPhase::Restoring {
            return false;
        }
        *phase = ConversationPhase::Restoring;
        true
    }

    /// Forgets every conversation; ids from the old session are meaningless.
    pub fn reset(&self) {
        let mut phases = self.phases.lock().unwrap_or_else(|e| e.into_inner());
        phases.clear();
    }
}
