use common::ErrorLocation;

use std::io::Error as IoError;
use std::panic::Location;

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum OscError {
    #[error("OSC Encode Error: {message} {location}")]
    Encode {
        message: String,
        location: ErrorLocation,
    },

    #[error("OSC Decode Error: {message} {location}")]
    Decode {
        message: String,
        location: ErrorLocation,
    },

    #[error("OSC Send Error: {message} {location}")]
    Send {
        message: String,
        location: ErrorLocation,
    },

    #[error("OSC IO Error: {message} {location}")]
    Io {
        message: String,
        location: ErrorLocation,
    },
}

impl OscError {
    #[track_caller]
    pub(crate) fn decode(message: impl Into<String>) -> Self {
        OscError::Decode {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub(crate) fn encode(message: impl Into<String>) -> Self {
        OscError::Encode {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<IoError> for OscError {
    #[track_caller]
    fn from(error: IoError) -> Self {
        OscError::Io {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}
