//! Shared building blocks for the mixer bridge.
//!
//! Anything more than one crate in the workspace needs that carries no
//! bridge logic of its own.
//!
//! ## Architecture
//!
//! - **common** (this crate): error location tracking
//! - **bridge-core**: registry, translator, IPC broker, WebSocket/UDP adapters
//! - **mixer-bridge**: binary wiring config, logging and the core together

pub mod error;

pub use error::error_location::ErrorLocation;
