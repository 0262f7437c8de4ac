//! Application layer of chatkeep: the history sync controller, the host
//! boundary it talks through, and process wiring.

pub mod bootstrap;
pub mod host;
pub mod logging;
pub mod sync;
pub mod tracing_layer;

pub use bootstrap::{HistoryBootstrap, open_history_store};
pub use host::{HostEvent, InMemoryLiveBuffer, LiveConversationBuffer};
pub use sync::{AppendOutcome, ControllerOptions, HistorySyncController, RestoreOutcome};
