//! Outbound OSC delivery.

use super::codec::encode_message;
use super::message::ControlMessage;
use crate::error::osc::OscError;

use common::ErrorLocation;

use std::net::SocketAddr;
use std::panic::Location;
use std::sync::Arc;

use tokio::net::UdpSocket;

/// Somewhere OSC messages can be sent, fire-and-forget.
///
/// Sending never waits: the translator and the refresh burst call it from
/// async contexts without yielding.
pub trait ControlSink: Send + Sync {
    fn send(&self, message: &ControlMessage) -> Result<(), OscError>;
}

/// Sends datagrams to the configured control-surface endpoint.
///
/// Shares its socket with the receive loop so replies come back to the port
/// the control surface is configured to talk to.
pub struct UdpControlSurface {
    socket: Arc<UdpSocket>,
    remote: SocketAddr,
}

impl UdpControlSurface {
    pub fn new(socket: Arc<UdpSocket>, remote: SocketAddr) -> Self {
        Self { socket, remote }
    }

    pub fn remote(&self) -> SocketAddr {
        self.remote
    }
}

impl ControlSink for UdpControlSurface {
    fn send(&self, message: &ControlMessage) -> Result<(), OscError> {
        let datagram = encode_message(message)?;
        let sent = self
            .socket
            .try_send_to(&datagram, self.remote)
            .map_err(|e| OscError::Send {
                message: format!("{} to {}: {e}", message.address, self.remote),
                location: ErrorLocation::from(Location::caller()),
            })?;
        if sent != datagram.len() {
            return Err(OscError::Send {
                message: format!(
                    "{} to {}: short write {sent}/{}",
                    message.address,
                    self.remote,
                    datagram.len()
                ),
                location: ErrorLocation::from(Location::caller()),
            });
        }
        Ok(())
    }
}
