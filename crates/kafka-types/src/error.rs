//! Error types for kafka-types crate.

use thiserror::Error;

/// Errors that can occur while encoding or decoding a message payload.
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Failed to encode '{message_type}' payload: {reason}")]
    Encode {
        message_type: String,
        reason: String,
    },

    #[error("Failed to decode '{message_type}' payload: {reason}")]
    Decode {
        message_type: String,
        reason: String,
    },
}

impl CodecError {
    /// Build an encode error for the given message type.
    pub fn encode(message_type: impl Into<String>, reason: impl ToString) -> Self {
        CodecError::Encode {
            message_type: message_type.into(),
            reason: reason.to_string(),
        }
    }

    /// Build a decode error for the given message type.
    pub fn decode(message_type: impl Into<String>, reason: impl ToString) -> Self {
        CodecError::Decode {
            message_type: message_type.into(),
            reason: reason.to_string(),
        }
    }

    /// The type identifier of the payload that failed.
    pub fn message_type(&self) -> &str {
        match self {
            CodecError::Encode { message_type, .. } | CodecError::Decode { message_type, .. } => {
                message_type
            }
        }
    }
}

/// Result type alias for codec operations.
pub type Result<T> = std::result::Result<T, CodecError>;
