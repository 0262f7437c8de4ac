//! Composition root: turns configuration into a wired-up controller.

use crate::host::LiveConversationBuffer;
use crate::sync::{ControllerOptions, HistorySyncController};
use anyhow::{Context, Result};
use chatkeep_core::config::{BackendKind, HistoryConfig};
use chatkeep_core::contact::SessionContext;
use chatkeep_core::history::HistoryStore;
use chatkeep_infrastructure::{
    ChatkeepPaths, ConfigService, JsonDirBackend, KvHistoryStore, MemoryBackend,
};
use std::sync::Arc;

/// Opens the history store selected by `config`.
pub async fn open_history_store(config: &HistoryConfig) -> Result<Arc<dyn HistoryStore>> {
    match config.backend {
        BackendKind::Memory => {
            tracing::info!("[Bootstrap] Using in-memory history backend");
            Ok(Arc::new(KvHistoryStore::new(MemoryBackend::new())))
        }
        BackendKind::JsonDir => {
            let dir = ChatkeepPaths::history_dir(config.data_dir.as_ref())
                .map_err(|e| anyhow::anyhow!("Failed to resolve history directory: {}", e))?;
            tracing::info!("[Bootstrap] Using JSON history backend at {:?}", dir);

            let backend = JsonDirBackend::new(&dir)
                .await
                .with_context(|| format!("Failed to open history directory {:?}", dir))?;
            Ok(Arc::new(KvHistoryStore::new(backend)))
        }
    }
}

/// Everything needed to build controllers for one process.
pub struct HistoryBootstrap {
    pub config: HistoryConfig,
    pub store: Arc<dyn HistoryStore>,
}

impl HistoryBootstrap {
    /// Bootstraps from an already loaded configuration.
    pub async fn from_config(config: HistoryConfig) -> Result<Self> {
        let store = open_history_store(&config).await?;
        Ok(Self { config, store })
    }

    /// Bootstraps from the configuration file behind `config_service`.
    pub async fn load(config_service: &ConfigService) -> Result<Self> {
        let config = config_service.get_config();
        tracing::debug!(
            "[Bootstrap] Loaded config from {:?}: {:?}",
            config_service.path(),
            config
        );
        Self::from_config(config).await
    }

    /// Creates a controller over `buffer`, starting with `session`.
    pub fn controller(
        &self,
        buffer: Arc<dyn LiveConversationBuffer>,
        session: SessionContext,
    ) -> HistorySyncController {
        HistorySyncController::new(
            self.store.clone(),
            buffer,
            session,
            ControllerOptions::from(&self.config),
        )
    }
}
