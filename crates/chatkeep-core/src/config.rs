//! History configuration model.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Which key-value backend persists history.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Volatile, process-lifetime storage.
    Memory,
    /// One JSON file per conversation on disk.
    #[default]
    JsonDir,
}

/// Root of `config.toml`.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct HistoryConfig {
    pub backend: BackendKind,
    /// Overrides the platform data directory.
    pub data_dir: Option<PathBuf>,
    /// Quiet period before a "conversation changed" burst triggers a restore.
    pub restore_debounce_ms: u64,
    /// Fields dropped before storage even when they hold plain data.
    pub strip_fields: Vec<String>,
    /// `tracing` filter directive used when `CHATKEEP_LOG` is unset.
    pub log_filter: String,
}

impl HistoryConfig {
    pub const DEFAULT_DEBOUNCE_MS: u64 = 100;

    pub fn restore_debounce(&self) -> Duration {
        Duration::from_millis(self.restore_debounce_ms)
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            data_dir: None,
            restore_debounce_ms: Self::DEFAULT_DEBOUNCE_MS,
            strip_fields: vec!["recommend_info".to_string()],
            log_filter: "info".to_string(),
        }
    }
}
