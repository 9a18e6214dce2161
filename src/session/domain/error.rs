//! Error types for session validation and parsing.

use super::{SessionId, SessionStatus};
use thiserror::Error;

/// Errors returned while mutating sessions.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionDomainError {
    /// The status transition is not permitted.
    #[error("invalid session status transition for {session_id}: {from} -> {to}")]
    InvalidStatusTransition {
        /// Session identifier.
        session_id: SessionId,
        /// Current status.
        from: SessionStatus,
        /// Requested status.
        to: SessionStatus,
    },

    /// Stream checkpoints must not be blank.
    #[error("last event id must not be empty")]
    EmptyEventId,
}

/// Error returned while parsing session statuses.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown session status: {0}")]
pub struct ParseSessionStatusError(pub String);
