pub mod env;
pub mod sections;

pub use sections::{
    ControlSurfaceConfig, IpcConfig, PollPolicy, RefreshConfig, WebConfig,
};

use crate::error::config::ConfigError;

use common::ErrorLocation;

use std::panic::Location;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use log::{LevelFilter, info, warn};
use serde::{Deserialize, Serialize};

pub const CONFIG_FILE_NAME: &str = "bridge.toml";
const CONFIG_DIR_NAME: &str = "mixer-bridge";
const CONFIG_PATH_ENV: &str = "BRIDGE_CONFIG";
const MAX_TRACK_COUNT: u32 = 1024;

// ============================================
// CONFIG STRUCT
// ============================================

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BridgeConfig {
    #[serde(default)]
    pub web: WebConfig,

    #[serde(default)]
    pub control_surface: ControlSurfaceConfig,

    #[serde(default)]
    pub ipc: IpcConfig,

    #[serde(default)]
    pub refresh: RefreshConfig,

    /// `error`, `warn`, `info`, `debug` or `trace`; build default when unset.
    #[serde(default)]
    pub log_level: Option<String>,

    /// Directory for the log file; stdout only when unset.
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

// ============================================
// IMPLEMENTATION
// ============================================

impl BridgeConfig {
    /// Load config from a TOML file.
    ///
    /// A missing file yields defaults. A file that exists but cannot be read
    /// or parsed is an error, as is a file with invalid values.
    pub fn load(config_path: &Path) -> Result<Self, ConfigError> {
        if !config_path.exists() {
            info!(
                "Config file not found at {}, using defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(config_path).map_err(|e| {
            warn!("Failed to read config file {}: {}", config_path.display(), e);
            ConfigError::ReadError {
                location: ErrorLocation::from(Location::caller()),
                path: config_path.to_path_buf(),
                source: e,
            }
        })?;

        let config = Self::from_toml(&contents).map_err(|reason| {
            warn!("Failed to parse config TOML {}: {}", config_path.display(), reason);
            ConfigError::ParseError {
                location: ErrorLocation::from(Location::caller()),
                path: config_path.to_path_buf(),
                reason,
            }
        })?;

        config.validate()?;

        info!("Config loaded from {}", config_path.display());
        Ok(config)
    }

    /// Load the file, then apply `.env` and `BRIDGE_*` overrides, then validate.
    pub fn load_with_env(config_path: &Path) -> Result<Self, ConfigError> {
        if let Ok(env_path) = dotenvy::dotenv() {
            info!("Loaded environment from {}", env_path.display());
        }

        let mut config = Self::load(config_path)?;
        env::apply_overrides(&mut config)?;
        config.validate()?;
        Ok(config)
    }

    fn from_toml(contents: &str) -> Result<Self, String> {
        toml::from_str(contents).map_err(|e| e.to_string())
    }

    /// Validate config values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] naming the first invalid value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.web.path.starts_with('/') {
            return Err(validation(format!(
                "web.path must start with '/': {:?}",
                self.web.path
            )));
        }
        if self.web.client_buffer == 0 {
            return Err(validation("web.client_buffer must be at least 1"));
        }

        if self.control_surface.host.is_empty() {
            return Err(validation("control_surface.host cannot be empty"));
        }
        if self.control_surface.port == 0 {
            return Err(validation("control_surface.port must be non-zero"));
        }

        if self.ipc.command_file == self.ipc.response_file {
            return Err(validation(format!(
                "ipc.command_file and ipc.response_file must differ: {}",
                self.ipc.command_file.display()
            )));
        }
        if self.ipc.queue_capacity == 0 {
            return Err(validation("ipc.queue_capacity must be at least 1"));
        }
        for (name, policy) in [
            ("bypass", &self.ipc.bypass),
            ("output_read", &self.ipc.output_read),
            ("full_read", &self.ipc.full_read),
            ("sends_read", &self.ipc.sends_read),
        ] {
            if policy.interval_ms == 0 || policy.max_attempts == 0 {
                return Err(validation(format!(
                    "ipc.{name} needs interval_ms > 0 and max_attempts > 0 (got {} ms x {})",
                    policy.interval_ms, policy.max_attempts
                )));
            }
        }

        if self.refresh.track_count == 0 || self.refresh.track_count > MAX_TRACK_COUNT {
            return Err(validation(format!(
                "refresh.track_count must be 1-{MAX_TRACK_COUNT}: {}",
                self.refresh.track_count
            )));
        }

        if let Some(level) = &self.log_level {
            if LevelFilter::from_str(level).is_err() {
                return Err(validation(format!("Invalid log_level: {level}")));
            }
        }

        Ok(())
    }

    /// Parsed `log_level`, if one was configured.
    pub fn level_filter(&self) -> Option<LevelFilter> {
        self.log_level
            .as_deref()
            .and_then(|level| LevelFilter::from_str(level).ok())
    }
}

/// Pick the config file: explicit argument, then `BRIDGE_CONFIG`, then the
/// per-user config directory.
pub fn resolve_config_path(explicit: Option<PathBuf>) -> PathBuf {
    if let Some(path) = explicit {
        return path;
    }
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }
    match dirs::config_dir() {
        Some(dir) => dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME),
        None => PathBuf::from(CONFIG_FILE_NAME),
    }
}

#[track_caller]
fn validation(reason: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        location: ErrorLocation::from(Location::caller()),
        reason: reason.into(),
    }
}
