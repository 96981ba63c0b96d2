use crate::broker::{BypassCommand, FxCommand};
use crate::error::message::MessageError;
use crate::osc::ControlMessage;

use common::ErrorLocation;

use std::panic::Location;

use serde::Deserialize;
use serde_json::Value;

/// Inbound client frame, one variant per `type`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// Relay straight to the control surface.
    #[serde(rename = "osc")]
    Osc(ControlMessage),

    /// Re-run the full refresh burst.
    #[serde(rename = "refresh")]
    Refresh,

    /// Fire-and-forget parameter write.
    #[serde(rename = "fx")]
    Fx(FxCommand),

    #[serde(rename = "fxBypass")]
    FxBypass(BypassCommand),

    #[serde(rename = "fxReadOutput")]
    FxReadOutput(TrackRef),

    #[serde(rename = "sendsReadAll")]
    SendsReadAll,

    #[serde(rename = "fxRead")]
    FxRead(TrackRef),
}

/// Payload of the per-track read requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackRef {
    pub track_idx: i32,
}

impl ClientMessage {
    pub const TYPES: [&'static str; 7] = [
        "osc",
        "refresh",
        "fx",
        "fxBypass",
        "fxReadOutput",
        "sendsReadAll",
        "fxRead",
    ];

    /// Parse a text frame.
    ///
    /// # Errors
    ///
    /// - [`MessageError::Malformed`] - not JSON, no string `type`, or bad fields
    /// - [`MessageError::UnknownType`] - well-formed but `type` is not one we handle
    #[track_caller]
    pub fn parse(text: &str) -> Result<Self, MessageError> {
        let location = ErrorLocation::from(Location::caller());
        let malformed = |message: String| MessageError::Malformed { message, location };

        let value: Value =
            serde_json::from_str(text).map_err(|e| malformed(format!("Invalid JSON: {e}")))?;

        let Some(message_type) = value.get("type").and_then(Value::as_str) else {
            return Err(malformed("Missing string field 'type'".to_string()));
        };

        if !Self::TYPES.contains(&message_type) {
            return Err(MessageError::UnknownType {
                message_type: message_type.to_string(),
                location,
            });
        }

        let message_type = message_type.to_string();
        serde_json::from_value(value)
            .map_err(|e| malformed(format!("Invalid '{message_type}' message: {e}")))
    }
}
