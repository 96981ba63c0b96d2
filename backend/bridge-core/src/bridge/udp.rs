//! Receive loop for OSC feedback from the control surface.

use crate::osc::decode_packet;
use crate::stats::BridgeStats;
use crate::translator::Translator;

use std::sync::Arc;
use std::time::Duration;

use log::{error, info, warn};
use tokio::net::UdpSocket;

/// Largest datagram accepted.
const MAX_DATAGRAM: usize = 65_536;

/// Back-off after a socket error, so a persistent error does not spin.
const RECV_ERROR_BACKOFF: Duration = Duration::from_millis(10);

pub(crate) async fn receive_loop(
    socket: Arc<UdpSocket>,
    translator: Translator,
    stats: Arc<BridgeStats>,
) {
    let mut buf = vec![0u8; MAX_DATAGRAM];
    info!("OSC receive loop started");

    loop {
        let (len, from) = match socket.recv_from(&mut buf).await {
            Ok(received) => received,
            Err(e) => {
                // Includes ICMP port-unreachable echoes from earlier sends.
                error!("OSC Error: {e}");
                tokio::time::sleep(RECV_ERROR_BACKOFF).await;
                continue;
            }
        };

        match decode_packet(&buf[..len]) {
            Ok(messages) => {
                for message in messages {
                    let _ = translator.on_control_surface_message(message).await;
                }
            }
            Err(e) => {
                stats.osc_error();
                warn!("Dropping datagram from {from}: {e}");
            }
        }
    }
}
