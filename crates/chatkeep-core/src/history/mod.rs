//! History persistence interfaces.
//!
//! - `store`: Ordered per-conversation history (`HistoryStore`)
//! - `backend`: Key-value persistence the store is built on (`KeyValueBackend`)

mod backend;
mod store;

pub use backend::KeyValueBackend;
pub use store::HistoryStore;
