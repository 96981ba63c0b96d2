//! Network boundary of the bridge: the WebSocket endpoint for clients and the
//! UDP socket shared with the control surface.
//!
//! [`start_bridge`] binds both, starts the broker actor, and returns a
//! [`BridgeHandle`] that owns every background task.

mod handle;
mod server;
mod udp;

pub use handle::BridgeHandle;
pub use server::start_bridge;
