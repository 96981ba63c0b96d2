use common::ErrorLocation;

use std::path::PathBuf;

use thiserror::Error as ThisError;

/// Failures of the file IPC channel and the request broker in front of it.
#[derive(Debug, ThisError)]
pub enum IpcError {
    #[error("IPC Write Error: {path}: {source} {location}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
        location: ErrorLocation,
    },

    #[error("IPC Read Error: {path}: {source} {location}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
        location: ErrorLocation,
    },

    /// The broker queue is full; the request was not accepted.
    #[error("IPC Busy Error: {message} {location}")]
    Busy {
        message: String,
        location: ErrorLocation,
    },

    /// The broker actor is gone (runtime shutting down).
    #[error("IPC Closed Error: {message} {location}")]
    Closed {
        message: String,
        location: ErrorLocation,
    },
}
