//! Subscriber setup for embedding hosts.

use crate::tracing_layer::{HistoryEvent, HistoryEventLayer};
use anyhow::{Context, Result};
use tokio::sync::mpsc::UnboundedSender;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Environment variable overriding the configured filter.
pub const LOG_ENV: &str = "CHATKEEP_LOG";

/// Installs the global tracing subscriber.
///
/// `default_filter` is used when `CHATKEEP_LOG` is unset or invalid. When
/// `events` is given, chatkeep events are also forwarded to it.
///
/// # Errors
///
/// Returns an error if the filter does not parse or a global subscriber
/// is already installed.
pub fn init_tracing(default_filter: &str, events: Option<UnboundedSender<HistoryEvent>>) -> Result<()> {
    let filter = match EnvFilter::try_from_env(LOG_ENV) {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_filter)
            .with_context(|| format!("Invalid log filter: {}", default_filter))?,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .with(events.map(HistoryEventLayer::new))
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(())
}
