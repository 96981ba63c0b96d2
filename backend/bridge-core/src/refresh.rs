//! Full refresh: ask the control surface to report every track's basic state.
//!
//! The queries carry no arguments and get no correlated reply; the control
//! surface answers with ordinary feedback, which reaches clients through the
//! inbound OSC path.

use crate::osc::{ControlMessage, ControlSink};

use log::{debug, warn};

/// Per-track queries, in the order they are sent.
pub const TRACK_QUERY_FIELDS: [&str; 5] = ["volume", "pan", "mute", "solo", "name"];

/// Every query address for tracks `1..=track_count`, track-major.
pub fn refresh_addresses(track_count: u32) -> impl Iterator<Item = String> {
    (1..=track_count).flat_map(|track| {
        TRACK_QUERY_FIELDS
            .iter()
            .map(move |field| format!("/track/{track}/{field}"))
    })
}

/// Send the whole burst. Individual send failures are logged and skipped.
///
/// Returns how many queries were handed to the sink.
pub fn full_refresh(sink: &dyn ControlSink, track_count: u32) -> usize {
    let mut sent = 0;
    let mut failed = 0;

    for address in refresh_addresses(track_count) {
        match sink.send(&ControlMessage::query(address)) {
            Ok(()) => sent += 1,
            Err(e) => {
                failed += 1;
                warn!("Refresh query failed: {e}");
            }
        }
    }

    debug!("Full refresh: {sent} queries sent, {failed} failed, {track_count} tracks");
    sent
}
