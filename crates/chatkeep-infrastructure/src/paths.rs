//! Unified path management for chatkeep files.
//!
//! This ensures consistency across all platforms (Linux, macOS, Windows).

use chatkeep_core::ChatkeepError;
use std::path::PathBuf;

const APP_DIR: &str = "chatkeep";

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Home directory could not be determined.
    HomeDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::HomeDirNotFound => write!(f, "Cannot find home directory"),
        }
    }
}

impl std::error::Error for PathError {}

impl From<PathError> for ChatkeepError {
    fn from(err: PathError) -> Self {
        ChatkeepError::config(err.to_string())
    }
}

/// Unified path management for chatkeep.
///
/// # Directory Structure
///
/// ```text
/// ~/.config/chatkeep/          # Config directory
/// └── config.toml              # HistoryConfig
///
/// ~/.local/share/chatkeep/     # Data directory
/// └── history/                 # One JSON file per conversation
/// ```
pub struct ChatkeepPaths;

impl ChatkeepPaths {
    /// Returns the chatkeep configuration directory.
    ///
    /// # Returns
    ///
    /// - `Ok(PathBuf)`: Path to config directory (e.g., `~/.config/chatkeep/`)
    /// - `Err(PathError::HomeDirNotFound)`: Could not determine directory
    pub fn config_dir() -> Result<PathBuf, PathError> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or(PathError::HomeDirNotFound)
    }

    /// Returns the chatkeep data directory (e.g., `~/.local/share/chatkeep/`).
    pub fn data_dir() -> Result<PathBuf, PathError> {
        dirs::data_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or(PathError::HomeDirNotFound)
    }

    /// Returns the path to the main configuration file.
    pub fn config_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Returns the history directory, honoring a configured data directory.
    pub fn history_dir(data_dir_override: Option<&PathBuf>) -> Result<PathBuf, PathError> {
        let base = match data_dir_override {
            Some(dir) => dir.clone(),
            None => Self::data_dir()?,
        };
        Ok(base.join("history"))
    }
}
