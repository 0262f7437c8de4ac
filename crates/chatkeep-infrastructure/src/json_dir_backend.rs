//! Directory-of-JSON-files key-value backend.

use crate::storage::AtomicJsonFile;
use async_trait::async_trait;
use chatkeep_core::history::KeyValueBackend;
use chatkeep_core::{ChatkeepError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::fs;
use uuid::Uuid;

const FILE_EXTENSION: &str = "json";

/// On-disk record; the key is kept alongside the value so it can be listed.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Entry {
    key: String,
    value: Value,
}

/// Key-value backend storing one JSON file per key.
///
/// Directory structure:
/// ```text
/// base_dir/
/// ├── 3f0c...e1.json   # { "key": "history/[\"Alice\",\"\"]", "value": [...] }
/// └── 9a41...07.json
/// ```
///
/// File names are UUIDv5 digests of the key, so arbitrary display names
/// never leak into paths.
pub struct JsonDirBackend {
    base_dir: PathBuf,
}

impl JsonDirBackend {
    /// Creates a backend rooted at `base_dir`, creating the directory.
    pub async fn new(base_dir: impl AsRef<Path>) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        fs::create_dir_all(&base_dir).await?;

        tracing::debug!("[JsonDirBackend] Using directory: {:?}", base_dir);
        Ok(Self { base_dir })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn entry_file(&self, key: &str) -> AtomicJsonFile<Entry> {
        let file_id = Uuid::new_v5(&Uuid::NAMESPACE_OID, key.as_bytes());
        AtomicJsonFile::new(
            self.base_dir
                .join(format!("{}.{}", file_id, FILE_EXTENSION)),
        )
    }
}

async fn run_blocking<T, F>(f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ChatkeepError::internal(format!("Storage task failed: {}", e)))?
}

#[async_trait]
impl KeyValueBackend for JsonDirBackend {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let file = self.entry_file(key);
        let entry = run_blocking(move || Ok(file.load()?)).await?;
        Ok(entry.map(|entry| entry.value))
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        let file = self.entry_file(key);
        let entry = Entry {
            key: key.to_string(),
            value,
        };
        run_blocking(move || Ok(file.replace(&entry)?)).await
    }

    async fn keys(&self) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        let mut dir = fs::read_dir(&self.base_dir).await?;

        while let Some(dir_entry) = dir.next_entry().await? {
            let path = dir_entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(FILE_EXTENSION) {
                continue;
            }

            let file = AtomicJsonFile::<Entry>::new(path.clone());
            match run_blocking(move || Ok(file.load()?)).await {
                Ok(Some(entry)) => keys.push(entry.key),
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!("[JsonDirBackend] Skipping unreadable file {:?}: {}", path, e);
                }
            }
        }

        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_set_then_get() {
        let temp_dir = TempDir::new().unwrap();
        let backend = JsonDirBackend::new(temp_dir.path()).await.unwrap();

        backend.set("Alice_&&_", json!([{"text": "hi"}])).await.unwrap();

        assert_eq!(
            backend.get("Alice_&&_").await.unwrap(),
            Some(json!([{"text": "hi"}]))
        );
        assert_eq!(backend.get("Bob_&&_").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_keys_survive_reopen() {
        let temp_dir = TempDir::new().unwrap();
        {
            let backend = JsonDirBackend::new(temp_dir.path()).await.unwrap();
            backend.set("b/slash_&&_", json!(1)).await.unwrap();
            backend.set("a_&&_x", json!(2)).await.unwrap();
        }

        let reopened = JsonDirBackend::new(temp_dir.path()).await.unwrap();
        assert_eq!(
            reopened.keys().await.unwrap(),
            vec!["a_&&_x".to_string(), "b/slash_&&_".to_string()]
        );
        assert_eq!(reopened.get("a_&&_x").await.unwrap(), Some(json!(2)));
    }

    #[tokio::test]
    async fn test_corrupt_file_surfaces_as_error() {
        let temp_dir = TempDir::new().unwrap();
        let backend = JsonDirBackend::new(temp_dir.path()).await.unwrap();
        backend.set("k", json!(1)).await.unwrap();

        let path = backend.entry_file("k").path().to_path_buf();
        std::fs::write(&path, "{oops").unwrap();

        let err = backend.get("k").await.unwrap_err();
        assert!(err.is_serialization());
        assert!(backend.keys().await.unwrap().is_empty());
    }
}
