use crate::output::{Output, OutputFormat};
use color_eyre::eyre::eyre;
use color_eyre::Result;
use history_sync_core::SyncResult;
use serde_json::json;
use std::path::Path;

pub async fn run_sync(config_path: Option<&Path>, output: &Output) -> Result<()> {
    tracing::debug!("Sync command started");

    let config = super::load_config(config_path)?;
    let orchestrator = super::build_orchestrator(&config)?;

    let result = orchestrator.sync().await;
    report(&result, output);

    match result.error {
        None => Ok(()),
        Some(e) => Err(eyre!("Sync cycle failed ({}): {}", e.kind(), e)),
    }
}

fn report(result: &SyncResult, output: &Output) {
    match output.format() {
        OutputFormat::Human => {
            if result.is_success() {
                output.success(format!(
                    "Fetched {} records, inserted {} new ({} dropped) in {:.1}s",
                    result.fetched,
                    result.inserted,
                    result.dropped,
                    result.duration.as_secs_f64()
                ));
            }
        }
        OutputFormat::Json | OutputFormat::JsonPretty => {
            output.json(&json!({
                "type": "sync_result",
                "success": result.is_success(),
                "fetched": result.fetched,
                "dropped": result.dropped,
                "inserted": result.inserted,
                "duration_ms": result.duration.as_millis() as u64,
                "error_kind": result.error.as_ref().map(|e| e.kind()),
                "error": result.error.as_ref().map(|e| e.to_string()),
            }));
        }
    }
}
