use common::ErrorLocation;

use thiserror::Error as ThisError;

/// Why an inbound client frame was dropped.
#[derive(Debug, ThisError)]
pub enum MessageError {
    /// Not JSON, not an object, or fields of the wrong shape.
    #[error("Malformed Message Error: {message} {location}")]
    Malformed {
        message: String,
        location: ErrorLocation,
    },

    #[error("Unknown Message Type Error: {message_type} {location}")]
    UnknownType {
        message_type: String,
        location: ErrorLocation,
    },
}
