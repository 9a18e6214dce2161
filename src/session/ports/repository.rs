//! Repository port for session persistence.

use crate::session::domain::{Session, SessionId, SessionStatus};
use crate::task::domain::TaskId;
use crate::workspace::domain::ProjectId;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for session repository operations.
pub type SessionRepositoryResult<T> = Result<T, SessionRepositoryError>;

/// Session persistence contract.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Stores a new session unless its task already has an active one.
    ///
    /// The check and the insert are one atomic step in every
    /// implementation: two concurrent calls for the same task produce
    /// exactly one stored session.
    ///
    /// # Errors
    ///
    /// Returns [`SessionRepositoryError::ActiveSessionExists`] when another
    /// pending or running session exists for the task.
    async fn create_if_no_active(&self, session: &Session) -> SessionRepositoryResult<()>;

    /// Writes `session` back if the stored row still has status `expected`.
    ///
    /// The status comparison and the write are one atomic step, so two
    /// writers that read the same status cannot both succeed.
    ///
    /// # Errors
    ///
    /// Returns [`SessionRepositoryError::NotFound`] when the session does
    /// not exist and [`SessionRepositoryError::StatusChanged`] when another
    /// writer moved it away from `expected` first.
    async fn update(&self, session: &Session, expected: SessionStatus)
    -> SessionRepositoryResult<()>;

    /// Finds a session by identifier.
    async fn find_by_id(&self, id: SessionId) -> SessionRepositoryResult<Option<Session>>;

    /// Finds the pending or running session of a task.
    async fn find_active_for_task(&self, task_id: TaskId)
    -> SessionRepositoryResult<Option<Session>>;

    /// Lists every session of a task, newest first.
    async fn list_for_task(&self, task_id: TaskId) -> SessionRepositoryResult<Vec<Session>>;

    /// Lists every pending or running session, oldest first.
    async fn list_active(&self) -> SessionRepositoryResult<Vec<Session>>;

    /// Lists the pending or running sessions of one project, oldest first.
    async fn list_active_for_project(
        &self,
        project_id: ProjectId,
    ) -> SessionRepositoryResult<Vec<Session>>;
}

/// Errors returned by session repository implementations.
#[derive(Debug, Clone, Error)]
pub enum SessionRepositoryError {
    /// The task already has a pending or running session.
    #[error("task {0} already has an active session")]
    ActiveSessionExists(TaskId),

    /// A session with the same identifier already exists.
    #[error("duplicate session identifier: {0}")]
    DuplicateSession(SessionId),

    /// The session was not found.
    #[error("session not found: {0}")]
    NotFound(SessionId),

    /// The stored status no longer matches the one the write was based on.
    #[error("session {session_id} is no longer {expected}")]
    StatusChanged {
        /// Session that was written concurrently.
        session_id: SessionId,
        /// Status the rejected write expected to replace.
        expected: SessionStatus,
    },

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl SessionRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
