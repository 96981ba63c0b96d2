//! Core of the mixer bridge.
//!
//! Connects three asynchronous channels:
//!
//! - WebSocket clients sending JSON control frames ([`bridge`], [`dispatch`])
//! - the control surface, speaking OSC over UDP ([`osc`], [`translator`], [`refresh`])
//! - the scripting host, reached through two shared files ([`broker`])
//!
//! Everything the clients see is fanned out through the [`registry`].

pub mod bridge;
pub mod broker;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod message;
pub mod osc;
pub mod refresh;
pub mod registry;
pub mod stats;
pub mod translator;


pub use bridge::{BridgeHandle, start_bridge};
pub use config::BridgeConfig;
