pub mod config;
pub mod ipc;
pub mod message;
pub mod osc;
pub mod ws;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    Osc(#[from] osc::OscError),

    #[error(transparent)]
    Ipc(#[from] ipc::IpcError),

    #[error(transparent)]
    Ws(#[from] ws::WsError),

    #[error(transparent)]
    Message(#[from] message::MessageError),
}
