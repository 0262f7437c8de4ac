//! Ordered append queue in front of the history store.
//!
//! The controller hands each sanitized message to a single writer task and
//! returns immediately. One task means appends reach the store in the order
//! they were issued; failures are logged and dropped, never retried.

use chatkeep_core::history::HistoryStore;
use chatkeep_core::identity::StableConversationKey;
use chatkeep_core::message::StoredMessage;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{mpsc, oneshot};

enum WriteCommand {
    Append {
        key: StableConversationKey,
        message: StoredMessage,
    },
    Flush(oneshot::Sender<()>),
}

/// Counters of completed append attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WriterStats {
    pub persisted: usize,
    pub failed: usize,
}

#[derive(Debug, Default)]
struct Counters {
    persisted: AtomicUsize,
    failed: AtomicUsize,
}

/// Handle to the writer task. Dropping every handle stops the task once
/// the queue is drained.
#[derive(Clone)]
pub struct HistoryWriter {
    sender: mpsc::UnboundedSender<WriteCommand>,
    counters: Arc<Counters>,
}

impl HistoryWriter {
    /// Spawns the writer task on the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn spawn(store: Arc<dyn HistoryStore>) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let counters = Arc::new(Counters::default());
        tokio::spawn(write_loop(store, receiver, counters.clone()));

        Self { sender, counters }
    }

    /// Queues an append. Returns false if the writer task has stopped.
    pub fn enqueue(&self, key: StableConversationKey, message: StoredMessage) -> bool {
        self.sender
            .send(WriteCommand::Append { key, message })
            .is_ok()
    }

    /// Waits until every append queued before this call has completed.
    pub async fn flush(&self) {
        let (done_tx, done_rx) = oneshot::channel();
        if self.sender.send(WriteCommand::Flush(done_tx)).is_ok() {
            let _ = done_rx.await;
        }
    }

    pub fn stats(&self) -> WriterStats {
        WriterStats {
            persisted: self.counters.persisted.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
        }
    }
}

async fn write_loop(
    store: Arc<dyn HistoryStore>,
    mut receiver: mpsc::UnboundedReceiver<WriteCommand>,
    counters: Arc<Counters>,
) {
    while let Some(command) = receiver.recv().await {
        match command {
            WriteCommand::Append { key, message } => match store.append(&key, message).await {
                Ok(()) => {
                    counters.persisted.fetch_add(1, Ordering::Relaxed);
                }
                Err(e) => {
                    counters.failed.fetch_add(1, Ordering::Relaxed);
                    tracing::warn!(
                        conversation = %key,
                        "[HistorySync] Failed to persist message, dropping it: {}",
                        e
                    );
                }
            },
            WriteCommand::Flush(done) => {
                let _ = done.send(());
            }
        }
    }

    tracing::debug!("[HistorySync] Writer stopped");
}
