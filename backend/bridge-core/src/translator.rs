//! Translation between client frames and control-surface OSC.

use crate::message::OutboundMessage;
use crate::osc::{ControlMessage, ControlSink};
use crate::refresh;
use crate::registry::{BroadcastReport, ConnectionRegistry};
use crate::stats::BridgeStats;

use std::sync::Arc;

use log::{error, info};

/// OSC side of the bridge.
///
/// Outbound sends are fire-and-forget; inbound messages go to every client.
#[derive(Clone)]
pub struct Translator {
    sink: Arc<dyn ControlSink>,
    registry: Arc<ConnectionRegistry>,
    stats: Arc<BridgeStats>,
    track_count: u32,
}

impl Translator {
    pub fn new(
        sink: Arc<dyn ControlSink>,
        registry: Arc<ConnectionRegistry>,
        stats: Arc<BridgeStats>,
        track_count: u32,
    ) -> Self {
        Self {
            sink,
            registry,
            stats,
            track_count,
        }
    }

    /// Relay one message to the control surface. Errors are logged, not returned.
    pub fn send_to_control_surface(&self, message: &ControlMessage) -> bool {
        info!("→ Reaper: {} {:?}", message.address, message.args);
        match self.sink.send(message) {
            Ok(()) => {
                self.stats.osc_sent();
                true
            }
            Err(e) => {
                self.stats.osc_error();
                error!("OSC send error: {e}");
                false
            }
        }
    }

    /// Broadcast a message from the control surface to every open client.
    pub async fn on_control_surface_message(&self, message: ControlMessage) -> BroadcastReport {
        info!("← Reaper: {} {:?}", message.address, message.args);
        self.stats.osc_received();
        self.registry
            .broadcast(&OutboundMessage::from(message))
            .await
    }

    /// Query volume, pan, mute, solo and name for every configured track.
    pub fn full_refresh(&self) -> usize {
        let sent = refresh::full_refresh(self.sink.as_ref(), self.track_count);
        let expected = self.track_count as usize * refresh::TRACK_QUERY_FIELDS.len();
        self.stats.osc_burst(sent, expected.saturating_sub(sent));
        sent
    }

    pub fn track_count(&self) -> u32 {
        self.track_count
    }
}
