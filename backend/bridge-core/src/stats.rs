//! Counters for things the bridge drops or gives up on without telling clients.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Live counters, shared as `Arc<BridgeStats>`.
#[derive(Debug, Default)]
pub struct BridgeStats {
    connections_accepted: AtomicU64,
    malformed_messages: AtomicU64,
    unknown_message_types: AtomicU64,
    osc_received: AtomicU64,
    osc_sent: AtomicU64,
    osc_errors: AtomicU64,
    broker_resolved: AtomicU64,
    broker_timeouts: AtomicU64,
    broker_busy: AtomicU64,
    broker_io_errors: AtomicU64,
}

/// Point-in-time copy of [`BridgeStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub connections_accepted: u64,
    pub malformed_messages: u64,
    pub unknown_message_types: u64,
    pub osc_received: u64,
    pub osc_sent: u64,
    pub osc_errors: u64,
    pub broker_resolved: u64,
    pub broker_timeouts: u64,
    pub broker_busy: u64,
    pub broker_io_errors: u64,
}

macro_rules! counter {
    ($($name:ident => $field:ident),* $(,)?) => {
        impl BridgeStats {
            $(
                pub fn $name(&self) {
                    let _ = self.$field.fetch_add(1, Ordering::Relaxed);
                }
            )*

            pub fn snapshot(&self) -> StatsSnapshot {
                StatsSnapshot {
                    $($field: self.$field.load(Ordering::Relaxed),)*
                }
            }
        }
    };
}

counter! {
    connection_accepted => connections_accepted,
    malformed_message => malformed_messages,
    unknown_message_type => unknown_message_types,
    osc_received => osc_received,
    osc_sent => osc_sent,
    osc_error => osc_errors,
    broker_resolved => broker_resolved,
    broker_timeout => broker_timeouts,
    broker_busy => broker_busy,
    broker_io_error => broker_io_errors,
}

impl BridgeStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a burst of datagrams at once.
    pub fn osc_burst(&self, sent: usize, failed: usize) {
        let _ = self.osc_sent.fetch_add(sent as u64, Ordering::Relaxed);
        let _ = self.osc_errors.fetch_add(failed as u64, Ordering::Relaxed);
    }
}
