//! Routes parsed client frames to the translator or the broker.

use crate::broker::{BrokerHandle, ReadRequest};
use crate::error::ipc::IpcError;
use crate::error::message::MessageError;
use crate::message::ClientMessage;
use crate::stats::BridgeStats;
use crate::translator::Translator;

use std::sync::Arc;

use log::{error, warn};

/// What became of one client frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatched {
    /// Relayed to the control surface.
    Relayed,
    /// Refresh burst sent; carries the number of queries.
    Refreshed(usize),
    /// Handed to the IPC broker.
    Queued,
    /// Dropped: unparsable, unknown, or refused downstream. Already logged.
    Dropped,
}

#[derive(Clone)]
pub struct Dispatcher {
    translator: Translator,
    broker: BrokerHandle,
    stats: Arc<BridgeStats>,
}

impl Dispatcher {
    pub fn new(translator: Translator, broker: BrokerHandle, stats: Arc<BridgeStats>) -> Self {
        Self {
            translator,
            broker,
            stats,
        }
    }

    pub fn translator(&self) -> &Translator {
        &self.translator
    }

    /// Parse and route a text frame. Never fails: problems are logged and counted.
    pub fn handle_text(&self, text: &str) -> Dispatched {
        match ClientMessage::parse(text) {
            Ok(message) => self.dispatch(message),
            Err(e @ MessageError::UnknownType { .. }) => {
                self.stats.unknown_message_type();
                warn!("Ignoring WebSocket message: {e}");
                Dispatched::Dropped
            }
            Err(e @ MessageError::Malformed { .. }) => {
                self.stats.malformed_message();
                error!("Invalid WebSocket message: {e}");
                Dispatched::Dropped
            }
        }
    }

    pub fn dispatch(&self, message: ClientMessage) -> Dispatched {
        match message {
            ClientMessage::Osc(osc) => {
                if self.translator.send_to_control_surface(&osc) {
                    Dispatched::Relayed
                } else {
                    Dispatched::Dropped
                }
            }
            ClientMessage::Refresh => Dispatched::Refreshed(self.translator.full_refresh()),
            ClientMessage::Fx(command) => self.queued("fx", self.broker.write_param(command)),
            ClientMessage::FxBypass(command) => {
                self.queued("fxBypass", self.broker.submit(command))
            }
            ClientMessage::FxReadOutput(track) => self.queued(
                "fxReadOutput",
                self.broker.submit(ReadRequest::output_only(track)),
            ),
            ClientMessage::SendsReadAll => {
                self.queued("sendsReadAll", self.broker.submit(ReadRequest::AllSends))
            }
            ClientMessage::FxRead(track) => {
                self.queued("fxRead", self.broker.submit(ReadRequest::full(track)))
            }
        }
    }

    fn queued(&self, message_type: &str, result: Result<(), IpcError>) -> Dispatched {
        match result {
            Ok(()) => Dispatched::Queued,
            Err(e @ IpcError::Busy { .. }) => {
                warn!("Dropping {message_type}: {e}");
                Dispatched::Dropped
            }
            Err(e) => {
                error!("Dropping {message_type}: {e}");
                Dispatched::Dropped
            }
        }
    }
}
