//! Startup sequence for the bridge binary.

use crate::error::BridgeAppError;
use crate::logger;

use bridge_core::config::resolve_config_path;
use bridge_core::{BridgeConfig, start_bridge};

use common::ErrorLocation;

use std::panic::Location;
use std::path::{Path, PathBuf};

use log::info;

/// One line per boundary, logged once the logger is up.
pub fn config_summary(config: &BridgeConfig) -> Vec<String> {
    vec![
        format!(
            "WebSocket: ws://{}{}",
            config.web.bind_address(),
            config.web.path
        ),
        format!(
            "OSC: sending to {}, listening on {}",
            config.control_surface.remote_address(),
            config.control_surface.listen_address()
        ),
        format!(
            "FX IPC: commands {}, responses {}",
            config.ipc.command_file.display(),
            config.ipc.response_file.display()
        ),
        format!("Refresh: {} tracks", config.refresh.track_count),
    ]
}

/// Load config, start logging, run the bridge until Ctrl-C.
pub async fn run(explicit_config: Option<PathBuf>) -> Result<(), BridgeAppError> {
    let config_path = resolve_config_path(explicit_config);
    let config = BridgeConfig::load_with_env(&config_path)?;

    logger::initialize(config.log_dir.as_deref(), config.level_filter())?;
    log_startup(&config, &config_path);

    let handle = start_bridge(config).await?;
    info!("Bridge running, clients connect to {}", handle.ws_url());

    tokio::signal::ctrl_c()
        .await
        .map_err(|e| BridgeAppError::Runtime {
            message: format!("Failed to listen for Ctrl-C: {e}"),
            location: ErrorLocation::from(Location::caller()),
        })?;

    info!("Ctrl-C received, stopping");
    let stats = handle.stats();
    info!(
        "Served {} connections, {} OSC in / {} OSC out, {} FX requests resolved, {} timed out",
        stats.connections_accepted,
        stats.osc_received,
        stats.osc_sent,
        stats.broker_resolved,
        stats.broker_timeouts
    );
    handle.shutdown();
    Ok(())
}

fn log_startup(config: &BridgeConfig, config_path: &Path) {
    info!("Using config {}", config_path.display());
    for line in config_summary(config) {
        info!("{line}");
    }
}
