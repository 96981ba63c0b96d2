//! Control-surface protocol: OSC 1.0 messages over UDP.
//!
//! - [`message`] - `ControlMessage` / `OscArg` and their JSON form
//! - [`codec`] - datagram encode/decode, bundles flattened on decode
//! - [`transport`] - the [`ControlSink`] seam and its UDP implementation

pub mod codec;
pub mod message;
pub mod transport;

pub use codec::{decode_packet, encode_message};
pub use message::{ControlMessage, OscArg};
pub use transport::{ControlSink, UdpControlSurface};
