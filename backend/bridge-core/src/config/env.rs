//! `BRIDGE_*` environment overrides, applied on top of the config file.

use super::BridgeConfig;
use crate::error::config::ConfigError;

use common::ErrorLocation;

use std::fmt::Display;
use std::panic::Location;
use std::path::PathBuf;
use std::str::FromStr;

use log::info;

pub const WEB_PORT: &str = "BRIDGE_WEB_PORT";
pub const OSC_HOST: &str = "BRIDGE_OSC_HOST";
pub const OSC_PORT: &str = "BRIDGE_OSC_PORT";
pub const OSC_LISTEN_PORT: &str = "BRIDGE_OSC_LISTEN_PORT";
pub const IPC_COMMAND_FILE: &str = "BRIDGE_IPC_COMMAND_FILE";
pub const IPC_RESPONSE_FILE: &str = "BRIDGE_IPC_RESPONSE_FILE";
pub const LOG_DIR: &str = "BRIDGE_LOG_DIR";

/// Apply every set `BRIDGE_*` variable to `config`.
///
/// # Errors
///
/// Returns [`ConfigError::EnvError`] when a numeric variable does not parse.
pub fn apply_overrides(config: &mut BridgeConfig) -> Result<(), ConfigError> {
    if let Some(port) = parsed(WEB_PORT)? {
        config.web.port = port;
    }
    if let Some(host) = raw(OSC_HOST) {
        config.control_surface.host = host;
    }
    if let Some(port) = parsed(OSC_PORT)? {
        config.control_surface.port = port;
    }
    if let Some(port) = parsed(OSC_LISTEN_PORT)? {
        config.control_surface.listen_port = port;
    }
    if let Some(path) = raw(IPC_COMMAND_FILE) {
        config.ipc.command_file = PathBuf::from(path);
    }
    if let Some(path) = raw(IPC_RESPONSE_FILE) {
        config.ipc.response_file = PathBuf::from(path);
    }
    if let Some(path) = raw(LOG_DIR) {
        config.log_dir = Some(PathBuf::from(path));
    }
    Ok(())
}

fn raw(variable: &str) -> Option<String> {
    match std::env::var(variable) {
        Ok(value) if !value.trim().is_empty() => {
            info!("Config override from {variable}");
            Some(value.trim().to_string())
        }
        _ => None,
    }
}

#[track_caller]
fn parsed<T>(variable: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    let Some(value) = raw(variable) else {
        return Ok(None);
    };
    value
        .parse::<T>()
        .map(Some)
        .map_err(|e| ConfigError::EnvError {
            location: ErrorLocation::from(Location::caller()),
            variable: variable.to_string(),
            value,
            reason: e.to_string(),
        })
}
