//! Registry of live WebSocket clients and broadcast fan-out.
//!
//! Connections are kept in registration order and every broadcast walks them
//! in that order. Anything not `Open` is skipped without error.

mod connection;

pub use connection::{ClientConnection, ConnectionState, SendOutcome};

use crate::message::OutboundMessage;

use std::sync::Arc;

use log::{debug, warn};
use tokio::sync::RwLock;
use uuid::Uuid;

/// Result of one broadcast.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub delivered: usize,
    pub skipped: usize,
}

/// Set of currently registered client connections.
pub struct ConnectionRegistry {
    connections: RwLock<Vec<Arc<ClientConnection>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(Vec::new()),
        }
    }

    /// Add a connection. Re-registering an id replaces it in place.
    pub async fn register(&self, connection: Arc<ClientConnection>) {
        let mut conns = self.connections.write().await;
        match conns.iter_mut().find(|c| c.id() == connection.id()) {
            Some(existing) => {
                warn!("Connection {} registered twice, replacing", connection.id());
                *existing = connection;
            }
            None => conns.push(connection),
        }
    }

    /// Remove a connection by id, returning it if it was registered.
    pub async fn unregister(&self, connection_id: Uuid) -> Option<Arc<ClientConnection>> {
        let mut conns = self.connections.write().await;
        let index = conns.iter().position(|c| c.id() == connection_id)?;
        Some(conns.remove(index))
    }

    /// Serialize once and send to every open connection.
    pub async fn broadcast(&self, message: &OutboundMessage) -> BroadcastReport {
        match serde_json::to_string(message) {
            Ok(json) => self.broadcast_text(Arc::new(json)).await,
            Err(e) => {
                warn!("Failed to serialize {} broadcast: {}", message.kind(), e);
                BroadcastReport::default()
            }
        }
    }

    /// Send an already serialized frame to every open connection.
    pub async fn broadcast_text(&self, json: Arc<String>) -> BroadcastReport {
        let conns = self.connections.read().await;
        let mut report = BroadcastReport::default();

        for conn in conns.iter() {
            if !conn.is_open() {
                report.skipped += 1;
                continue;
            }
            match conn.send(Arc::clone(&json)) {
                SendOutcome::Delivered => report.delivered += 1,
                SendOutcome::Full => {
                    warn!("Client {} outbound queue full, dropping message", conn.id());
                    report.skipped += 1;
                }
                SendOutcome::Closed => {
                    debug!("Client {} went away during broadcast", conn.id());
                    report.skipped += 1;
                }
            }
        }

        report
    }

    pub async fn len(&self) -> usize {
        self.connections.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.connections.read().await.is_empty()
    }

    /// Ids in registration order.
    pub async fn connection_ids(&self) -> Vec<Uuid> {
        self.connections.read().await.iter().map(|c| c.id()).collect()
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
