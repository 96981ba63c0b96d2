use crate::osc::{ControlMessage, OscArg};

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Frame broadcast to every open client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum OutboundMessage {
    /// An OSC message received from the control surface.
    #[serde(rename = "osc")]
    Osc { address: String, args: Vec<OscArg> },

    /// Effect parameters and bypass flags for one track.
    #[serde(rename = "fxValues", rename_all = "camelCase")]
    FxValues {
        track_idx: i32,
        params: Vec<FxParamValue>,
        /// Keyed by effect slot; `true` means bypassed.
        bypassed: BTreeMap<i32, bool>,
    },

    /// Send levels for every track, keyed by track index.
    #[serde(rename = "allSendValues")]
    AllSendValues {
        tracks: BTreeMap<i32, Vec<SendValue>>,
    },
}

impl OutboundMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            OutboundMessage::Osc { .. } => "osc",
            OutboundMessage::FxValues { .. } => "fxValues",
            OutboundMessage::AllSendValues { .. } => "allSendValues",
        }
    }
}

impl From<ControlMessage> for OutboundMessage {
    fn from(message: ControlMessage) -> Self {
        OutboundMessage::Osc {
            address: message.address,
            args: message.args,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FxParamValue {
    pub fx_idx: i32,
    pub param_idx: i32,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendValue {
    pub send_idx: i32,
    pub vol: f64,
}
