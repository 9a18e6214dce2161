//! Mapping of service errors onto HTTP responses.
//!
//! Every service error converts into an [`ApiError`] through an exhaustive
//! `match`, so a new error variant cannot silently fall through to a
//! generic 500. Internal failures are logged here and rendered with a fixed
//! message; their details never reach the response body.

use crate::config_vault::{ports::ConfigRepositoryError, services::ConfigVaultError};
use crate::interaction::{ports::InteractionRepositoryError, services::InteractionServiceError};
use crate::session::{ports::SessionRepositoryError, services::SessionServiceError};
use crate::sidecar::{ports::SidecarError, services::SidecarServiceError};
use crate::task::{ports::TaskRepositoryError, services::TaskServiceError};
use crate::workspace::{
    ports::{OrchestratorError, ProjectRepositoryError},
    services::WorkspaceServiceError,
};
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::fmt::Display;

/// Error response rendered as `{"error": "<message>"}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

impl ApiError {
    /// Builds an error with an explicit status and public message.
    #[must_use]
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// 400 with `message`.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// 401 with `message`.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    /// 404 with `message`.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    /// 409 with `message`.
    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    /// Logs `err` and returns a 500 carrying only `public`.
    #[must_use]
    pub fn internal(err: &impl Display, public: &str) -> Self {
        tracing::error!(error = %err, "{public}");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, public)
    }

    /// Logs `err` and returns a 502 carrying only `public`.
    #[must_use]
    pub fn bad_gateway(err: &impl Display, public: &str) -> Self {
        tracing::warn!(error = %err, "{public}");
        Self::new(StatusCode::BAD_GATEWAY, public)
    }

    /// Response status.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Public message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: &self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<OrchestratorError> for ApiError {
    fn from(err: OrchestratorError) -> Self {
        match err {
            OrchestratorError::NotFound(_) | OrchestratorError::NotReady(_) => {
                Self::internal(&err, "workspace address could not be resolved")
            }
            OrchestratorError::Unavailable(_) => {
                Self::bad_gateway(&err, "workspace orchestrator is unreachable")
            }
            OrchestratorError::Runtime(_) => Self::internal(&err, "workspace operation failed"),
        }
    }
}

impl From<SidecarError> for ApiError {
    fn from(err: SidecarError) -> Self {
        match err {
            SidecarError::Unreachable(_)
            | SidecarError::UpstreamStatus { .. }
            | SidecarError::Protocol(_) => Self::bad_gateway(&err, err.public_message()),
        }
    }
}

impl From<ProjectRepositoryError> for ApiError {
    fn from(err: ProjectRepositoryError) -> Self {
        match err {
            ProjectRepositoryError::NotFound(_) => Self::not_found("project not found"),
            ProjectRepositoryError::DuplicateProject(_) | ProjectRepositoryError::Persistence(_) => {
                Self::internal(&err, "failed to access projects")
            }
        }
    }
}

impl From<WorkspaceServiceError> for ApiError {
    fn from(err: WorkspaceServiceError) -> Self {
        match err {
            WorkspaceServiceError::Domain(inner) => Self::bad_request(inner.to_string()),
            WorkspaceServiceError::Repository(inner) => inner.into(),
            WorkspaceServiceError::Orchestrator(inner) => inner.into(),
            WorkspaceServiceError::NotFound(_) => Self::not_found("project not found"),
            WorkspaceServiceError::Forbidden(_) => {
                Self::new(StatusCode::FORBIDDEN, "access denied")
            }
        }
    }
}

impl From<ConfigVaultError> for ApiError {
    fn from(err: ConfigVaultError) -> Self {
        match err {
            ConfigVaultError::Validation(inner) => Self::bad_request(inner.to_string()),
            ConfigVaultError::Repository(inner) => match inner {
                ConfigRepositoryError::VersionConflict(_) => {
                    Self::conflict("configuration was updated concurrently")
                }
                ConfigRepositoryError::VersionNotFound { version, .. } => {
                    Self::not_found(format!("configuration version {version} not found"))
                }
                ConfigRepositoryError::ActiveVersion { version, .. } => Self::bad_request(format!(
                    "configuration version {version} is active and cannot be deleted"
                )),
                ConfigRepositoryError::Persistence(_) => {
                    Self::internal(&inner, "failed to access configuration")
                }
            },
            ConfigVaultError::Cipher(inner) => {
                Self::internal(&inner, "failed to process credentials")
            }
            ConfigVaultError::NoActiveConfig(_) => Self::not_found("config not found"),
            ConfigVaultError::NoCredential(_) => Self::not_found("no API key configured"),
        }
    }
}

impl From<SessionServiceError> for ApiError {
    fn from(err: SessionServiceError) -> Self {
        match err {
            SessionServiceError::Domain(inner) => Self::bad_request(inner.to_string()),
            SessionServiceError::Repository(inner) => match inner {
                SessionRepositoryError::ActiveSessionExists(_) => {
                    Self::conflict("task already has an active session")
                }
                SessionRepositoryError::NotFound(_) => Self::not_found("session not found"),
                SessionRepositoryError::StatusChanged { .. } => {
                    Self::conflict("session changed concurrently; retry")
                }
                SessionRepositoryError::DuplicateSession(_)
                | SessionRepositoryError::Persistence(_) => {
                    Self::internal(&inner, "failed to access sessions")
                }
            },
            SessionServiceError::NotFound(_) => Self::not_found("session not found"),
            SessionServiceError::SessionAlreadyActive(_) => {
                Self::conflict("task already has an active session")
            }
            SessionServiceError::Contended(_) => {
                Self::conflict("session changed concurrently; retry")
            }
        }
    }
}

impl From<TaskServiceError> for ApiError {
    fn from(err: TaskServiceError) -> Self {
        match err {
            TaskServiceError::Domain(inner) => Self::bad_request(inner.to_string()),
            TaskServiceError::Repository(inner) => match inner {
                TaskRepositoryError::NotFound(_) => Self::not_found("task not found"),
                TaskRepositoryError::DuplicateTask(_) | TaskRepositoryError::Persistence(_) => {
                    Self::internal(&inner, "failed to access tasks")
                }
            },
            TaskServiceError::Workspace(inner) => inner.into(),
            TaskServiceError::Orchestrator(inner) => inner.into(),
            TaskServiceError::Session(inner) => inner.into(),
            TaskServiceError::Config(inner) => inner.into(),
            TaskServiceError::Sidecar(inner) => inner.into(),
            TaskServiceError::Interaction(inner) => (*inner).into(),
            TaskServiceError::Prompt(inner) => Self::internal(&inner, "failed to render prompt"),
            TaskServiceError::TaskNotFound(_) => Self::not_found("task not found"),
            TaskServiceError::NoActiveSession(_) => Self::bad_request("task is not running"),
            TaskServiceError::SessionNotFound(_) => Self::not_found("session not found"),
            rejected @ (TaskServiceError::SessionTaskMismatch { .. }
            | TaskServiceError::UnsupportedMessageType(_)) => {
                Self::bad_request(rejected.to_string())
            }
        }
    }
}

impl From<InteractionServiceError> for ApiError {
    fn from(err: InteractionServiceError) -> Self {
        match err {
            InteractionServiceError::Domain(inner) => Self::bad_request(inner.to_string()),
            InteractionServiceError::Repository(inner) => match inner {
                InteractionRepositoryError::DuplicateInteraction(_)
                | InteractionRepositoryError::Persistence(_) => {
                    Self::internal(&inner, "failed to access interactions")
                }
            },
            InteractionServiceError::Access(inner) => inner.into(),
        }
    }
}

impl From<SidecarServiceError> for ApiError {
    fn from(err: SidecarServiceError) -> Self {
        match err {
            SidecarServiceError::Workspace(inner) => inner.into(),
            SidecarServiceError::Task(inner) => inner.into(),
            SidecarServiceError::Orchestrator(inner) => inner.into(),
            SidecarServiceError::Upstream(inner) => inner.into(),
            rejected @ (SidecarServiceError::MissingSessionId
            | SidecarServiceError::InvalidSessionId(_)) => {
                Self::bad_request(rejected.to_string())
            }
        }
    }
}

/// Result type for HTTP handlers.
pub type ApiResult<T> = Result<T, ApiError>;
