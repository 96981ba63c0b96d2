use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Open,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    Delivered,
    /// Outbound queue full; this message is dropped for this client only.
    Full,
    /// Writer side is gone; the connection is now `Closed`.
    Closed,
}

/// Handle to one WebSocket client.
///
/// Frames are queued to the connection's writer task; the registry never
/// touches the socket directly.
#[derive(Debug)]
pub struct ClientConnection {
    id: Uuid,
    outbound: mpsc::Sender<Arc<String>>,
    closed: AtomicBool,
}

impl ClientConnection {
    pub fn new(outbound: mpsc::Sender<Arc<String>>) -> Self {
        Self::with_id(Uuid::new_v4(), outbound)
    }

    pub fn with_id(id: Uuid, outbound: mpsc::Sender<Arc<String>>) -> Self {
        Self {
            id,
            outbound,
            closed: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> ConnectionState {
        if self.closed.load(Ordering::Acquire) || self.outbound.is_closed() {
            ConnectionState::Closed
        } else {
            ConnectionState::Open
        }
    }

    pub fn is_open(&self) -> bool {
        self.state() == ConnectionState::Open
    }

    /// Mark closed; later broadcasts skip it.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    /// Queue a frame without waiting.
    pub fn send(&self, payload: Arc<String>) -> SendOutcome {
        if self.closed.load(Ordering::Acquire) {
            return SendOutcome::Closed;
        }
        match self.outbound.try_send(payload) {
            Ok(()) => SendOutcome::Delivered,
            Err(TrySendError::Full(_)) => SendOutcome::Full,
            Err(TrySendError::Closed(_)) => {
                self.close();
                SendOutcome::Closed
            }
        }
    }
}
