use bridge_core::error::CoreError;
use bridge_core::error::config::ConfigError;

use common::ErrorLocation;

use thiserror::Error;

/// Errors that stop the bridge binary from starting or running.
#[derive(Debug, Error)]
pub enum BridgeAppError {
    /// Logger could not be set up
    #[error("Logger Error: {message} {location}")]
    Logger {
        message: String,
        location: ErrorLocation,
    },

    /// Config file or environment was unusable
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Bridge failed to bind or start
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Signal handling failed while running
    #[error("Runtime Error: {message} {location}")]
    Runtime {
        message: String,
        location: ErrorLocation,
    },
}
