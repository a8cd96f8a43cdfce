pub mod config;
pub mod daemon;
pub mod sync;

use color_eyre::eyre::{eyre, Result};
use history_sync_config::Config;
use history_sync_core::{PgStoreConnector, SyncOrchestrator};
use history_sync_sources::TautulliClient;
use std::path::Path;
use tracing::debug;

/// Load and validate configuration; missing settings abort before any cycle runs
pub(crate) fn load_config(path: Option<&Path>) -> Result<Config> {
    Config::load(path).map_err(|e| eyre!("Configuration error: {}", e))
}

pub(crate) fn build_orchestrator(config: &Config) -> Result<SyncOrchestrator> {
    let source = TautulliClient::new(&config.source)
        .map_err(|e| eyre!("Failed to create Tautulli client: {}", e))?;
    let store = PgStoreConnector::new(&config.store);

    debug!(
        source = %config.source.base_url(),
        store = %config.store.redacted_url(),
        history_length = config.source.history_length,
        "Building sync orchestrator"
    );

    Ok(SyncOrchestrator::new(Box::new(source), Box::new(store))
        .with_history_length(config.source.history_length))
}
