//! JSON frames exchanged with WebSocket clients.

mod client;
mod outbound;

pub use client::{ClientMessage, TrackRef};
pub use outbound::{FxParamValue, OutboundMessage, SendValue};
