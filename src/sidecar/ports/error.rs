//! Failures talking to the in-pod API.

use std::sync::Arc;
use thiserror::Error;

/// Errors returned by sidecar adapters.
///
/// `Display` may include upstream URLs. Use [`SidecarError::public_message`]
/// for anything returned to API callers or broadcast to clients.
#[derive(Debug, Clone, Error)]
pub enum SidecarError {
    /// The in-pod API could not be reached or timed out.
    #[error("workspace unreachable: {0}")]
    Unreachable(Arc<dyn std::error::Error + Send + Sync>),

    /// The in-pod API answered with a non-success status.
    #[error("workspace returned status {status}: {body}")]
    UpstreamStatus {
        /// Upstream status code.
        status: u16,
        /// Upstream body, truncated.
        body: String,
    },

    /// The in-pod API answered with something that could not be understood.
    #[error("workspace protocol error: {0}")]
    Protocol(Arc<dyn std::error::Error + Send + Sync>),
}

impl SidecarError {
    /// Wraps a transport failure.
    pub fn unreachable(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Unreachable(Arc::new(err))
    }

    /// Wraps a malformed exchange.
    pub fn protocol(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Protocol(Arc::new(err))
    }

    /// Returns whether the upstream reported the resource as missing.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::UpstreamStatus { status: 404, .. })
    }

    /// Returns a message safe to show to API callers.
    ///
    /// Never includes addresses or upstream bodies.
    #[must_use]
    pub const fn public_message(&self) -> &'static str {
        match self {
            Self::Unreachable(_) => "workspace is unreachable",
            Self::UpstreamStatus { .. } => "workspace rejected the request",
            Self::Protocol(_) => "workspace sent an invalid response",
        }
    }
}

/// Result type for sidecar adapters.
pub type SidecarResult<T> = Result<T, SidecarError>;
