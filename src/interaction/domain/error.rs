//! Validation and parse errors for interactions.

use super::MessageType;
use thiserror::Error;

/// Errors returned while building interactions.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InteractionDomainError {
    /// Content is empty after trimming.
    #[error("message content must not be empty")]
    EmptyContent,

    /// Content exceeds the limit for its message type.
    #[error("{message_type} content is {length} characters, maximum is {max}")]
    ContentTooLong {
        /// Message type.
        message_type: MessageType,
        /// Submitted length in characters.
        length: usize,
        /// Limit for the type.
        max: usize,
    },

    /// Metadata must be a JSON object.
    #[error("message metadata must be a JSON object")]
    MetadataNotObject,
}

/// Error returned while parsing message types.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown message type: {0}")]
pub struct ParseMessageTypeError(pub String);
