//! Command lines written for the scripting host.

use crate::message::{OutboundMessage, TrackRef};

use super::response::ResponseSet;

use serde::{Deserialize, Serialize};

/// Single parameter write. Written as `<track>,<fx>,<param>,<value>`; the host
/// sends nothing back.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FxCommand {
    pub track_idx: i32,
    pub fx_idx: i32,
    pub param_idx: i32,
    pub value: f64,
}

impl FxCommand {
    pub fn command_line(&self) -> String {
        format!(
            "{},{},{},{}\n",
            self.track_idx, self.fx_idx, self.param_idx, self.value
        )
    }
}

/// Toggle bypass on one effect slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BypassCommand {
    pub track_idx: i32,
    pub fx_idx: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadRequest {
    /// Every parameter and bypass flag on the track.
    Full(i32),
    /// Output stage only.
    OutputOnly(i32),
    /// Send levels of every track.
    AllSends,
}

/// Request kinds, each with its own poll policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    BypassToggle,
    OutputRead,
    FullRead,
    SendsRead,
}

impl RequestKind {
    pub fn label(&self) -> &'static str {
        match self {
            RequestKind::BypassToggle => "FX Bypass",
            RequestKind::OutputRead => "FX Read Output",
            RequestKind::FullRead => "FX Read",
            RequestKind::SendsRead => "Sends Read All",
        }
    }
}

/// A request that expects an answer in the response file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrokerRequest {
    Bypass(BypassCommand),
    Read(ReadRequest),
}

impl BrokerRequest {
    pub fn kind(&self) -> RequestKind {
        match self {
            BrokerRequest::Bypass(_) => RequestKind::BypassToggle,
            BrokerRequest::Read(ReadRequest::Full(_)) => RequestKind::FullRead,
            BrokerRequest::Read(ReadRequest::OutputOnly(_)) => RequestKind::OutputRead,
            BrokerRequest::Read(ReadRequest::AllSends) => RequestKind::SendsRead,
        }
    }

    pub fn command_line(&self) -> String {
        match self {
            BrokerRequest::Bypass(cmd) => format!("B,{},{}\n", cmd.track_idx, cmd.fx_idx),
            BrokerRequest::Read(ReadRequest::Full(track_idx)) => format!("R,{track_idx}\n"),
            BrokerRequest::Read(ReadRequest::OutputOnly(track_idx)) => format!("O,{track_idx}\n"),
            BrokerRequest::Read(ReadRequest::AllSends) => "SENDS\n".to_string(),
        }
    }

    /// Track the answer belongs to; `None` for the all-tracks sends read.
    pub fn track_idx(&self) -> Option<i32> {
        match self {
            BrokerRequest::Bypass(cmd) => Some(cmd.track_idx),
            BrokerRequest::Read(ReadRequest::Full(track_idx))
            | BrokerRequest::Read(ReadRequest::OutputOnly(track_idx)) => Some(*track_idx),
            BrokerRequest::Read(ReadRequest::AllSends) => None,
        }
    }

    /// Shape the parsed answer into this kind's broadcast.
    ///
    /// A bypass toggle only reports bypass flags; parameter lines in its
    /// answer are ignored.
    pub fn resolve(&self, answer: ResponseSet) -> OutboundMessage {
        match self {
            BrokerRequest::Bypass(cmd) => OutboundMessage::FxValues {
                track_idx: cmd.track_idx,
                params: Vec::new(),
                bypassed: answer.bypassed,
            },
            BrokerRequest::Read(ReadRequest::Full(track_idx))
            | BrokerRequest::Read(ReadRequest::OutputOnly(track_idx)) => {
                OutboundMessage::FxValues {
                    track_idx: *track_idx,
                    params: answer.params,
                    bypassed: answer.bypassed,
                }
            }
            BrokerRequest::Read(ReadRequest::AllSends) => OutboundMessage::AllSendValues {
                tracks: answer.sends,
            },
        }
    }
}

impl From<BypassCommand> for BrokerRequest {
    fn from(cmd: BypassCommand) -> Self {
        BrokerRequest::Bypass(cmd)
    }
}

impl From<ReadRequest> for BrokerRequest {
    fn from(read: ReadRequest) -> Self {
        BrokerRequest::Read(read)
    }
}

impl ReadRequest {
    pub fn full(track: TrackRef) -> Self {
        ReadRequest::Full(track.track_idx)
    }

    pub fn output_only(track: TrackRef) -> Self {
        ReadRequest::OutputOnly(track.track_idx)
    }
}
