//! The two shared files the scripting host reads and writes.

use crate::error::ipc::IpcError;

use common::ErrorLocation;

use std::future::Future;
use std::io::ErrorKind;
use std::panic::Location;
use std::path::{Path, PathBuf};

use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;

/// Command/response channel to the scripting host.
///
/// The broker only talks to the host through this trait, so it can be driven
/// by an in-memory channel in tests.
pub trait IpcChannel: Send + Sync + 'static {
    /// Truncate the response slot.
    fn clear_response(&self) -> impl Future<Output = Result<(), IpcError>> + Send;

    /// Append one newline-terminated command.
    fn append_command(&self, line: &str) -> impl Future<Output = Result<(), IpcError>> + Send;

    /// Current response slot content; empty when nothing has been written.
    fn read_response(&self) -> impl Future<Output = Result<String, IpcError>> + Send;
}

/// [`IpcChannel`] over two files on disk.
#[derive(Debug, Clone)]
pub struct FileChannel {
    command_path: PathBuf,
    response_path: PathBuf,
}

impl FileChannel {
    pub fn new(command_path: impl Into<PathBuf>, response_path: impl Into<PathBuf>) -> Self {
        Self {
            command_path: command_path.into(),
            response_path: response_path.into(),
        }
    }

    pub fn command_path(&self) -> &Path {
        &self.command_path
    }

    pub fn response_path(&self) -> &Path {
        &self.response_path
    }
}

impl IpcChannel for FileChannel {
    async fn clear_response(&self) -> Result<(), IpcError> {
        fs::write(&self.response_path, b"")
            .await
            .map_err(|source| IpcError::Write {
                path: self.response_path.clone(),
                source,
                location: ErrorLocation::from(Location::caller()),
            })
    }

    async fn append_command(&self, line: &str) -> Result<(), IpcError> {
        let write_error = |source: std::io::Error| IpcError::Write {
            path: self.command_path.clone(),
            source,
            location: ErrorLocation::from(Location::caller()),
        };

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.command_path)
            .await
            .map_err(write_error)?;
        file.write_all(line.as_bytes()).await.map_err(write_error)?;
        file.flush().await.map_err(write_error)
    }

    async fn read_response(&self) -> Result<String, IpcError> {
        match fs::read(&self.response_path).await {
            Ok(bytes) => Ok(String::from_utf8_lossy(&bytes).into_owned()),
            // The host has not created the file yet.
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(String::new()),
            Err(source) => Err(IpcError::Read {
                path: self.response_path.clone(),
                source,
                location: ErrorLocation::from(Location::caller()),
            }),
        }
    }
}
