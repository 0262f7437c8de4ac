//! Configuration service implementation.
//!
//! This module provides a ConfigService that loads the history configuration
//! from the configuration file (~/.config/chatkeep/config.toml).

use crate::paths::ChatkeepPaths;
use crate::storage::atomic_json::write_atomic;
use chatkeep_core::Result;
use chatkeep_core::config::HistoryConfig;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

/// Configuration service that loads and caches the history configuration.
///
/// This implementation reads the configuration from config.toml
/// and caches it to avoid repeated file I/O operations.
#[derive(Debug, Clone)]
pub struct ConfigService {
    path: PathBuf,
    /// Cached configuration loaded from file.
    config: Arc<RwLock<Option<HistoryConfig>>>,
}

impl ConfigService {
    /// Creates a ConfigService reading the given file.
    ///
    /// The configuration is loaded lazily on first access.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            config: Arc::new(RwLock::new(None)),
        }
    }

    /// Creates a ConfigService for the platform config file.
    pub fn default_location() -> Result<Self> {
        Ok(Self::new(ChatkeepPaths::config_file()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Gets the configuration, loading from file if not cached.
    ///
    /// A missing, empty or unreadable file yields the defaults; unreadable
    /// files are logged.
    pub fn get_config(&self) -> HistoryConfig {
        {
            let read_lock = self.config.read().unwrap_or_else(|e| e.into_inner());
            if let Some(ref cached) = *read_lock {
                return cached.clone();
            }
        }

        let loaded = self.load().unwrap_or_else(|e| {
            tracing::warn!(
                "[ConfigService] Failed to load {:?}, using defaults: {}",
                self.path,
                e
            );
            HistoryConfig::default()
        });

        {
            let mut write_lock = self.config.write().unwrap_or_else(|e| e.into_inner());
            *write_lock = Some(loaded.clone());
        }

        loaded
    }

    /// Reads the configuration file without touching the cache.
    pub fn load(&self) -> Result<HistoryConfig> {
        if !self.path.exists() {
            return Ok(HistoryConfig::default());
        }

        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(HistoryConfig::default());
        }

        Ok(toml::from_str(&content)?)
    }

    /// Writes the configuration atomically and refreshes the cache.
    pub fn save(&self, config: &HistoryConfig) -> Result<()> {
        let toml_string = toml::to_string_pretty(config)?;
        write_atomic(&self.path, toml_string.as_bytes())?;

        let mut write_lock = self.config.write().unwrap_or_else(|e| e.into_inner());
        *write_lock = Some(config.clone());
        Ok(())
    }

    /// Invalidates the cache, forcing a reload on next access.
    pub fn invalidate_cache(&self) {
        let mut write_lock = self.config.write().unwrap_or_else(|e| e.into_inner());
        *write_lock = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatkeep_core::config::BackendKind;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let service = ConfigService::new(temp_dir.path().join("config.toml"));

        assert_eq!(service.get_config(), HistoryConfig::default());
    }

    #[test]
    fn test_save_then_reload() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested/config.toml");
        let service = ConfigService::new(&path);

        let config = HistoryConfig {
            backend: BackendKind::Memory,
            restore_debounce_ms: 40,
            ..HistoryConfig::default()
        };
        service.save(&config).unwrap();

        let fresh = ConfigService::new(&path);
        assert_eq!(fresh.get_config(), config);
    }

    #[test]
    fn test_cache_until_invalidated() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        let service = ConfigService::new(&path);
        assert_eq!(service.get_config().restore_debounce_ms, 100);

        fs::write(&path, "restore_debounce_ms = 5\n").unwrap();
        assert_eq!(service.get_config().restore_debounce_ms, 100);

        service.invalidate_cache();
        assert_eq!(service.get_config().restore_debounce_ms, 5);
    }

    #[test]
    fn test_invalid_toml_falls_back_to_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "backend = [").unwrap();
        let service = ConfigService::new(&path);

        assert!(service.load().unwrap_err().is_serialization());
        assert_eq!(service.get_config(), HistoryConfig::default());
    }
}
