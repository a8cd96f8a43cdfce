use color_eyre::Result;
use history_sync_core::PollingDriver;
use std::path::Path;
use tracing::{info, warn};

pub async fn run_daemon(
    config_path: Option<&Path>,
    interval_override: Option<u64>,
    no_startup_sync: bool,
) -> Result<()> {
    let mut config = super::load_config(config_path)?;
    if let Some(interval) = interval_override {
        if interval == 0 {
            return Err(color_eyre::eyre::eyre!("--interval must be greater than zero"));
        }
        config.scheduler.interval_secs = interval;
    }
    if no_startup_sync {
        config.scheduler.run_on_startup = false;
    }

    let orchestrator = super::build_orchestrator(&config)?;
    let driver = PollingDriver::new(orchestrator, &config.scheduler);

    tokio::select! {
        _ = driver.run() => {
            warn!("Polling loop exited unexpectedly");
        }
        signal = shutdown_signal() => {
            info!(operation = "daemon_shutdown", signal, "Received termination signal, shutting down");
        }
    }

    Ok(())
}

#[cfg(unix)]
async fn shutdown_signal() -> &'static str {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => tokio::select! {
            _ = tokio::signal::ctrl_c() => "SIGINT",
            _ = sigterm.recv() => "SIGTERM",
        },
        Err(e) => {
            warn!(error = %e, "Failed to install SIGTERM handler, listening for Ctrl-C only");
            let _ = tokio::signal::ctrl_c().await;
            "SIGINT"
        }
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() -> &'static str {
    let _ = tokio::signal::ctrl_c().await;
    "Ctrl-C"
}
