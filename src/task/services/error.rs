//! Error type shared by task services.

use crate::config_vault::services::ConfigVaultError;
use crate::interaction::domain::MessageType;
use crate::interaction::services::InteractionServiceError;
use crate::session::domain::SessionId;
use crate::session::services::SessionServiceError;
use crate::sidecar::ports::SidecarError;
use crate::task::{
    domain::{TaskDomainError, TaskId},
    ports::TaskRepositoryError,
};
use crate::workspace::{ports::OrchestratorError, services::WorkspaceServiceError};
use thiserror::Error;

/// Service-level errors for task board and execution operations.
#[derive(Debug, Error)]
pub enum TaskServiceError {
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] TaskDomainError),
    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] TaskRepositoryError),
    /// Project lookup or ownership check failed.
    #[error(transparent)]
    Workspace(#[from] WorkspaceServiceError),
    /// Workspace address resolution failed.
    #[error(transparent)]
    Orchestrator(#[from] OrchestratorError),
    /// Session operation failed.
    #[error(transparent)]
    Session(#[from] SessionServiceError),
    /// Agent configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigVaultError),
    /// The in-pod API rejected or missed a call.
    #[error(transparent)]
    Sidecar(#[from] SidecarError),
    /// Publishing an interaction failed.
    #[error(transparent)]
    Interaction(Box<InteractionServiceError>),
    /// The execution prompt could not be rendered.
    #[error("prompt rendering failed: {0}")]
    Prompt(#[from] minijinja::Error),
    /// The task does not exist in the addressed project.
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),
    /// The task has no pending or running session to stop.
    #[error("task {0} has no active session")]
    NoActiveSession(TaskId),
    /// The session does not exist.
    #[error("session not found: {0}")]
    SessionNotFound(SessionId),
    /// The session belongs to another task.
    #[error("session {session_id} does not belong to task {task_id}")]
    SessionTaskMismatch {
        /// Requested session.
        session_id: SessionId,
        /// Task named in the request.
        task_id: TaskId,
    },
    /// Agents may not post this message type.
    #[error("agents cannot post {0} messages")]
    UnsupportedMessageType(MessageType),
}

impl From<InteractionServiceError> for TaskServiceError {
    fn from(err: InteractionServiceError) -> Self {
        Self::Interaction(Box::new(err))
    }
}

/// Result type for task service operations.
pub type TaskServiceResult<T> = Result<T, TaskServiceError>;
