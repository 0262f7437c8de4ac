//! History sync controller.
//!
//! Reacts to host lifecycle events: every appended message is sanitized,
//! keyed by the peer's stable identity and queued for the store; every
//! selected conversation whose live buffer is empty gets its stored history
//! remapped into the current session and installed in one assignment.

use super::debounce::RestoreDebouncer;
use super::outcome::{AppendOutcome, RestoreOutcome};
use super::phase::{ConversationPhase, PhaseTracker};
use super::writer::{HistoryWriter, WriterStats};
use crate::host::{HostEvent, LiveConversationBuffer};
use chatkeep_core::config::HistoryConfig;
use chatkeep_core::contact::SessionContext;
use chatkeep_core::history::HistoryStore;
use chatkeep_core::identity::{IdentityResolver, StableConversationKey};
use chatkeep_core::message::{LiveMessage, StoredMessage, fields, sanitize};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Tunables of the controller, usually taken from [`HistoryConfig`].
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerOptions {
    pub restore_debounce: Duration,
    pub strip_fields: Vec<String>,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self::from(&HistoryConfig::default())
    }
}

impl From<&HistoryConfig> for ControllerOptions {
    fn from(config: &HistoryConfig) -> Self {
        Self {
            restore_debounce: config.restore_debounce(),
            strip_fields: config.strip_fields.clone(),
        }
    }
}

struct ControllerInner {
    store: Arc<dyn HistoryStore>,
    buffer: Arc<dyn LiveConversationBuffer>,
    session: RwLock<Arc<SessionContext>>,
    /// Bumped on every login; restores started under an older value are stale.
    generation: AtomicU64,
    phases: PhaseTracker,
    writer: HistoryWriter,
    debouncer: RestoreDebouncer,
    strip_fields: Vec<String>,
}

/// Keeps the host's conversation buffers and the history store in step.
///
/// Cheap to clone; clones share all state. Entry points never fail and
/// never block: persistence runs on spawned tasks and problems are logged.
#[derive(Clone)]
pub struct HistorySyncController {
    inner: Arc<ControllerInner>,
}

impl HistorySyncController {
    /// Creates a controller for the given session.
    ///
    /// Must be called inside a tokio runtime; the append writer is spawned
    /// immediately.
    pub fn new(
        store: Arc<dyn HistoryStore>,
        buffer: Arc<dyn LiveConversationBuffer>,
        session: SessionContext,
        options: ControllerOptions,
    ) -> Self {
        let writer = HistoryWriter::spawn(store.clone());

        Self {
            inner: Arc::new(ControllerInner {
                store,
                buffer,
                session: RwLock::new(Arc::new(session)),
                generation: AtomicU64::new(0),
                phases: PhaseTracker::new(),
                writer,
                debouncer: RestoreDebouncer::new(options.restore_debounce),
                strip_fields: options.strip_fields,
            }),
        }
    }

    /// Dispatches one host event.
    pub fn handle(&self, event: HostEvent) {
        match event {
            HostEvent::SessionStarted(session) => self.start_session(session),
            HostEvent::MessageAppended(message) => {
                self.on_message_appended(&message);
            }
            HostEvent::ConversationSelected(conversation) => {
                drop(self.on_conversation_selected(&conversation));
            }
            HostEvent::ConversationChanged(current) => self.on_conversation_changed(current),
        }
    }

    /// Drives the controller from a host event channel until it closes,
    /// then waits for queued appends.
    pub async fn run(self, mut events: mpsc::UnboundedReceiver<HostEvent>) {
        tracing::info!("[HistorySync] Event loop started");
        while let Some(event) = events.recv().await {
            self.handle(event);
        }
        self.flush().await;
        tracing::info!("[HistorySync] Event loop stopped");
    }

    /// Swaps in the contact directory of a new login.
    pub fn start_session(&self, session: SessionContext) {
        let contacts = session.len();
        {
            let mut current = self
                .inner
                .session
                .write()
                .unwrap_or_else(|e| e.into_inner());
            *current = Arc::new(session);
        }
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
        self.inner.debouncer.cancel();
        self.inner.phases.reset();

        tracing::info!("[HistorySync] New session with {} contacts", contacts);
    }

    /// Persists a sanitized copy of a message the host just appended.
    ///
    /// Returns once the copy is queued; the write completes later.
    pub fn on_message_appended(&self, message: &LiveMessage) -> AppendOutcome {
        let Some(peer) = message.get_str(fields::PEER) else {
            tracing::warn!("[HistorySync] Message without peer, not persisted");
            return AppendOutcome::MissingPeer;
        };

        let session = self.inner.session_snapshot();
        let Some(contact) = session.contact(peer) else {
            tracing::warn!(
                peer,
                "[HistorySync] Peer not in contact directory, message not persisted"
            );
            return AppendOutcome::UnknownPeer(peer.to_string());
        };

        let key = IdentityResolver::resolve_stable_key(contact);
        let sanitized = sanitize(message, &self.inner.strip_fields);
        if !sanitized.stripped.is_empty() {
            tracing::debug!(
                "[HistorySync] Stripped fields before storage: {:?}",
                sanitized.stripped
            );
        }

        let mut stored = sanitized.message;
        stored.insert(fields::PEER_DISPLAY_NAME, contact.display_name.clone());
        stored.insert(fields::PEER_ALIAS, contact.alias.clone());

        if !self.inner.writer.enqueue(key.clone(), stored) {
            tracing::warn!(conversation = %key, "[HistorySync] Writer stopped, message not persisted");
            return AppendOutcome::WriterClosed;
        }

        AppendOutcome::Queued {
            key,
            stripped: sanitized.stripped,
        }
    }

    /// Starts a restore for a freshly selected conversation.
    ///
    /// Returns immediately; the handle resolves when the restore finished.
    pub fn on_conversation_selected(&self, conversation: &str) -> JoinHandle<RestoreOutcome> {
        let inner = self.inner.clone();
        let conversation = conversation.to_string();
        tokio::spawn(async move { inner.restore(&conversation).await })
    }

    /// Debounces bursts of "content changed" signals into one restore for
    /// the conversation carried by the last signal.
    pub fn on_conversation_changed(&self, current: Option<String>) {
        let inner = self.inner.clone();
        self.inner.debouncer.schedule(async move {
            match current {
                Some(conversation) => {
                    let outcome = inner.restore(&conversation).await;
                    tracing::debug!(
                        "[HistorySync] Debounced restore of {}: {:?}",
                        conversation,
                        outcome
                    );
                }
                None => tracing::trace!("[HistorySync] {:?}", RestoreOutcome::NoConversation),
            }
        });
    }

    /// Restores `conversation` now, bypassing the debounce.
    pub async fn restore(&self, conversation: &str) -> RestoreOutcome {
        self.inner.restore(conversation).await
    }

    /// Waits for every append queued so far to complete.
    pub async fn flush(&self) {
        self.inner.writer.flush().await;
    }

    pub fn writer_stats(&self) -> WriterStats {
        self.inner.writer.stats()
    }

    pub fn phase(&self, conversation: &str) -> ConversationPhase {
        self.inner.phases.phase(conversation)
    }
}

impl ControllerInner {
    fn session_snapshot(&self) -> Arc<SessionContext> {
        self.session
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    async fn restore(&self, conversation: &str) -> RestoreOutcome {
        if self.buffer.has_messages(conversation).await {
            self.phases.set(conversation, ConversationPhase::Live);
            return RestoreOutcome::SkippedLiveBuffer;
        }

        if !self.phases.begin_restore(conversation) {
            return RestoreOutcome::AlreadyRestoring;
        }

        let generation = self.generation.load(Ordering::SeqCst);
        let session = self.session_snapshot();
        let Some(key) = IdentityResolver::new(&session).stable_key_for(conversation) else {
            tracing::warn!(
                conversation,
                "[HistorySync] Selected conversation not in contact directory"
            );
            if self.is_current(generation) {
                self.phases.set(conversation, ConversationPhase::Idle);
            }
            return RestoreOutcome::UnknownConversation;
        };

        let history = match self.store.read(&key).await {
            Ok(history) => history,
            Err(e) => {
                tracing::warn!(conversation = %key, "[HistorySync] Failed to read history: {}", e);
                if self.is_current(generation) {
                    self.phases.set(conversation, ConversationPhase::Idle);
                }
                return RestoreOutcome::Failed(e.to_string());
            }
        };

        if !self.is_current(generation) {
            tracing::debug!(conversation = %key, "[HistorySync] Session changed during restore");
            return RestoreOutcome::Stale;
        }

        let resolver = IdentityResolver::new(&session);
        let total = history.len();
        let messages: Vec<LiveMessage> = history
            .into_iter()
            .filter_map(|stored| remap(stored, &key, &resolver))
            .collect();
        let dropped = total - messages.len();
        if dropped > 0 {
            tracing::warn!(
                conversation = %key,
                "[HistorySync] Dropped {} of {} stored messages with no matching contact",
                dropped,
                total
            );
        }

        if messages.is_empty() {
            self.phases.set(conversation, ConversationPhase::Live);
            return RestoreOutcome::NothingToRestore { dropped };
        }

        let restored = messages.len();
        let installed = self.buffer.install_if_empty(conversation, messages).await;
        self.phases.set(conversation, ConversationPhase::Live);

        if installed {
            tracing::info!(
                conversation = %key,
                "[HistorySync] Restored {} messages into {}",
                restored,
                conversation
            );
            RestoreOutcome::Installed { restored, dropped }
        } else {
            tracing::debug!(conversation = %key, "[HistorySync] Host filled buffer during restore");
            RestoreOutcome::SkippedLiveBuffer
        }
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }
}

/// Rewrites a stored record for the current session, or `None` on a
/// resolution miss or when the record belongs to another conversation.
fn remap(
    stored: StoredMessage,
    restoring: &StableConversationKey,
    resolver: &IdentityResolver<'_>,
) -> Option<LiveMessage> {
    let key = stored.peer_key()?;
    if &key != restoring {
        return None;
    }
    let ephemeral_id = resolver.resolve_ephemeral_id(&key)?;

    let mut live = stored.into_live();
    live.insert(fields::PEER, ephemeral_id);
    live.insert(fields::ACTUAL_SENDER, ephemeral_id);
    live.insert(fields::STATUS, Value::from(fields::STATUS_DELIVERED));
    live.insert(fields::UNREAD, Value::Bool(false));
    Some(live)
}
