pub mod config_service;
pub mod json_dir_backend;
pub mod kv_history_store;
pub mod memory_backend;
pub mod paths;
pub mod storage;

pub use crate::config_service::ConfigService;
pub use crate::json_dir_backend::JsonDirBackend;
pub use crate::kv_history_store::KvHistoryStore;
pub use crate::memory_backend::MemoryBackend;
pub use crate::paths::ChatkeepPaths;
