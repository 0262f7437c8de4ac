//! History synchronization between the host and the history store.
//!
//! # Module Structure
//!
//! - `controller`: Event entry points and the restore policy (`HistorySyncController`)
//! - `writer`: Ordered, fire-and-forget append queue (`HistoryWriter`)
//! - `debounce`: Cancelable restore timer (`RestoreDebouncer`)
//! - `phase`: Per-conversation restore state (`ConversationPhase`)
//! - `outcome`: What each entry point did (`AppendOutcome`, `RestoreOutcome`)

mod controller;
mod debounce;
mod outcome;
mod phase;
mod writer;

pub use controller::{ControllerOptions, HistorySyncController};
pub use debounce::RestoreDebouncer;
pub use outcome::{AppendOutcome, RestoreOutcome};
pub use phase::{ConversationPhase, PhaseTracker};
pub use writer::{HistoryWriter, WriterStats};
