//! Handle to a running bridge.

use crate::broker::BrokerHandle;
use crate::registry::ConnectionRegistry;
use crate::stats::{BridgeStats, StatsSnapshot};

use std::net::SocketAddr;
use std::sync::Arc;

use log::info;
use tokio::task::JoinHandle;

/// Returned by [`start_bridge`](crate::bridge::start_bridge).
///
/// Dropping the handle stops the accept loop (and with it every client
/// connection), the UDP receive loop and the broker actor.
pub struct BridgeHandle {
    pub(crate) web_addr: SocketAddr,
    pub(crate) ws_path: String,
    pub(crate) osc_addr: SocketAddr,
    pub(crate) registry: Arc<ConnectionRegistry>,
    pub(crate) stats: Arc<BridgeStats>,
    pub(crate) broker: BrokerHandle,
    pub(crate) tasks: Vec<JoinHandle<()>>,
}

impl BridgeHandle {
    /// Address the WebSocket listener is bound to.
    pub fn web_addr(&self) -> SocketAddr {
        self.web_addr
    }

    /// `ws://` URL clients should connect to.
    pub fn ws_url(&self) -> String {
        format!("ws://{}{}", self.web_addr, self.ws_path)
    }

    /// Local address receiving OSC from the control surface.
    pub fn osc_addr(&self) -> SocketAddr {
        self.osc_addr
    }

    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    pub fn broker(&self) -> &BrokerHandle {
        &self.broker
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Stop every background task.
    pub fn shutdown(mut self) {
        info!("Shutting down bridge on {}", self.web_addr);
        self.abort_tasks();
    }

    fn abort_tasks(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }
}

impl Drop for BridgeHandle {
    fn drop(&mut self) {
        self.abort_tasks();
    }
}
