//! Session creation, status transitions, and stream checkpoints.

use crate::session::{
    domain::{Session, SessionDomainError, SessionId, SessionStatus},
    ports::{SessionRepository, SessionRepositoryError},
};
use crate::task::domain::TaskId;
use crate::workspace::domain::ProjectId;
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;

/// Service-level errors for session operations.
#[derive(Debug, Error)]
pub enum SessionServiceError {
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] SessionDomainError),
    /// Repository operation failed.
    #[error(transparent)]
    Repository(SessionRepositoryError),
    /// The session does not exist.
    #[error("session not found: {0}")]
    NotFound(SessionId),
    /// The task already has a pending or running session.
    #[error("task {0} already has an active session")]
    SessionAlreadyActive(TaskId),
    /// Concurrent writers kept moving the session; the change was not applied.
    #[error("session {0} is being updated concurrently")]
    Contended(SessionId),
}

impl From<SessionRepositoryError> for SessionServiceError {
    fn from(err: SessionRepositoryError) -> Self {
        match err {
            SessionRepositoryError::ActiveSessionExists(task_id) => {
                Self::SessionAlreadyActive(task_id)
            }
            SessionRepositoryError::NotFound(session_id) => Self::NotFound(session_id),
            SessionRepositoryError::StatusChanged { session_id, .. } => Self::Contended(session_id),
            other => Self::Repository(other),
        }
    }
}

/// Reloads allowed when a status write loses a race.
const MAX_WRITE_ATTEMPTS: u32 = 3;

/// Result type for session service operations.
pub type SessionServiceResult<T> = Result<T, SessionServiceError>;

/// Session lifecycle orchestration service.
#[derive(Clone)]
pub struct SessionLifecycleService<R, C>
where
    R: SessionRepository + ?Sized,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    clock: Arc<C>,
}

impl<R, C> SessionLifecycleService<R, C>
where
    R: SessionRepository + ?Sized,
    C: Clock + Send + Sync,
{
    /// Creates a new session lifecycle service.
    #[must_use]
    pub const fn new(repository: Arc<R>, clock: Arc<C>) -> Self {
        Self { repository, clock }
    }

    /// Opens a pending session for a task.
    ///
    /// # Errors
    ///
    /// Returns [`SessionServiceError::SessionAlreadyActive`] when the task
    /// already has a pending or running session.
    pub async fn open_session(
        &self,
        task_id: TaskId,
        project_id: ProjectId,
        prompt: impl Into<String> + Send,
    ) -> SessionServiceResult<Session> {
        let session = Session::new(task_id, project_id, prompt, &*self.clock);
        self.repository.create_if_no_active(&session).await?;
        tracing::info!(session_id = %session.id(), task_id = %task_id, "session opened");
        Ok(session)
    }

    /// Loads a session.
    ///
    /// # Errors
    ///
    /// Returns [`SessionServiceError::NotFound`] when the session does not
    /// exist.
    pub async fn get(&self, session_id: SessionId) -> SessionServiceResult<Session> {
        self.repository
            .find_by_id(session_id)
            .await?
            .ok_or(SessionServiceError::NotFound(session_id))
    }

    /// Loads a session, applies `change`, and writes it back if the stored
    /// status is still the one that was read.
    ///
    /// `change` returns `false` to skip the write. When a concurrent writer
    /// moves the session first, the fresh copy is reloaded and `change` runs
    /// again, so it always sees the latest status.
    async fn modify<F>(
        &self,
        session_id: SessionId,
        mut change: F,
    ) -> SessionServiceResult<(Session, bool)>
    where
        F: FnMut(&mut Session, &C) -> SessionServiceResult<bool> + Send,
    {
        let mut attempt = 1;
        loop {
            let mut session = self.get(session_id).await?;
            let expected = session.status();
            if !change(&mut session, &*self.clock)? {
                return Ok((session, false));
            }
            match self.repository.update(&session, expected).await {
                Ok(()) => return Ok((session, true)),
                Err(SessionRepositoryError::StatusChanged { .. })
                    if attempt < MAX_WRITE_ATTEMPTS =>
                {
                    tracing::debug!(
                        session_id = %session_id,
                        attempt,
                        "session changed concurrently; reloading"
                    );
                    attempt += 1;
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Records the agent's acknowledgement of a dispatched run.
    ///
    /// A session that was stopped or failed while the dispatch was in
    /// flight keeps its terminal status; the acknowledgement is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`SessionServiceError::NotFound`] or a repository error.
    pub async fn mark_running(
        &self,
        session_id: SessionId,
        remote_session_id: Option<String>,
    ) -> SessionServiceResult<Session> {
        let (session, _) = self
            .modify(session_id, |session, clock| {
                if session.status() != SessionStatus::Pending {
                    tracing::info!(
                        session_id = %session_id,
                        status = %session.status(),
                        "ignoring run acknowledgement for session that is no longer pending"
                    );
                    return Ok(false);
                }
                session.mark_running(remote_session_id.clone(), clock)?;
                Ok(true)
            })
            .await?;
        Ok(session)
    }

    /// Marks a session failed.
    ///
    /// # Errors
    ///
    /// Returns [`SessionServiceError::Domain`] for terminal sessions.
    pub async fn mark_failed(
        &self,
        session_id: SessionId,
        reason: &str,
    ) -> SessionServiceResult<Session> {
        let (session, _) = self
            .modify(session_id, |session, clock| {
                session.fail(reason, clock)?;
                Ok(true)
            })
            .await?;
        tracing::warn!(session_id = %session_id, reason, "session failed");
        Ok(session)
    }

    /// Cancels a pending or running session.
    ///
    /// # Errors
    ///
    /// Returns [`SessionServiceError::Domain`] for terminal sessions,
    /// including one that settled while the cancellation was in flight.
    pub async fn cancel(&self, session_id: SessionId) -> SessionServiceResult<Session> {
        let (session, _) = self
            .modify(session_id, |session, clock| {
                session.cancel(clock)?;
                Ok(true)
            })
            .await?;
        tracing::info!(session_id = %session_id, "session cancelled");
        Ok(session)
    }

    /// Applies a status reported by the in-pod agent.
    ///
    /// Returns the session and whether its status changed.
    ///
    /// # Errors
    ///
    /// Returns [`SessionServiceError::NotFound`] for unknown sessions and
    /// [`SessionServiceError::Domain`] when the report contradicts the
    /// status machine.
    pub async fn update_status(
        &self,
        session_id: SessionId,
        status: SessionStatus,
        error: Option<&str>,
    ) -> SessionServiceResult<(Session, bool)> {
        let (session, changed) = self
            .modify(session_id, |session, clock| {
                Ok(session.apply_report(status, error, clock)?)
            })
            .await?;
        if changed {
            tracing::info!(session_id = %session_id, status = %status, "session status reported");
        }
        Ok((session, changed))
    }

    /// Stores the resumable stream checkpoint.
    ///
    /// # Errors
    ///
    /// Returns [`SessionServiceError::NotFound`] for unknown sessions and
    /// [`SessionServiceError::Domain`] for blank identifiers.
    pub async fn update_last_event_id(
        &self,
        session_id: SessionId,
        event_id: &str,
    ) -> SessionServiceResult<()> {
        self.modify(session_id, |session, clock| {
            session.record_event_id(event_id, clock)?;
            Ok(true)
        })
        .await?;
        Ok(())
    }

    /// Appends agent output to a session.
    ///
    /// # Errors
    ///
    /// Returns [`SessionServiceError::NotFound`] for unknown sessions.
    pub async fn append_output(
        &self,
        session_id: SessionId,
        chunk: &str,
    ) -> SessionServiceResult<()> {
        self.modify(session_id, |session, clock| {
            session.append_output(chunk, clock);
            Ok(true)
        })
        .await?;
        Ok(())
    }

    /// Returns the pending or running session of a task.
    ///
    /// # Errors
    ///
    /// Returns [`SessionServiceError::Repository`] when the lookup fails.
    pub async fn active_for_task(&self, task_id: TaskId) -> SessionServiceResult<Option<Session>> {
        Ok(self.repository.find_active_for_task(task_id).await?)
    }

    /// Lists a task's sessions, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`SessionServiceError::Repository`] when the lookup fails.
    pub async fn list_for_task(&self, task_id: TaskId) -> SessionServiceResult<Vec<Session>> {
        Ok(self.repository.list_for_task(task_id).await?)
    }

    /// Lists every pending or running session.
    ///
    /// # Errors
    ///
    /// Returns [`SessionServiceError::Repository`] when the lookup fails.
    pub async fn list_active(&self) -> SessionServiceResult<Vec<Session>> {
        Ok(self.repository.list_active().await?)
    }

    /// Lists the pending or running sessions of one project.
    ///
    /// # Errors
    ///
    /// Returns [`SessionServiceError::Repository`] when the lookup fails.
    pub async fn list_active_for_project(
        &self,
        project_id: ProjectId,
    ) -> SessionServiceResult<Vec<Session>> {
        Ok(self.repository.list_active_for_project(project_id).await?)
    }
}
