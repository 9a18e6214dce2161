//! Ownership-checked relay of file operations and streams.

use super::cancellation::CancellationRegistry;
use crate::session::domain::SessionId;
use crate::sidecar::{
    domain::{FileRequest, RelayResponse},
    ports::{RelayedStream, SidecarError, SidecarRelay, UpstreamSocket},
};
use crate::task::domain::TaskId;
use crate::task::services::{TaskAccess, TaskServiceError};
use crate::workspace::{
    domain::{Project, ProjectId, UserId, WorkspaceAddress},
    ports::OrchestratorError,
    services::{ProjectAccess, WorkspaceServiceError},
};
use futures::StreamExt;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Service-level errors for relayed operations.
#[derive(Debug, Error)]
pub enum SidecarServiceError {
    /// Project lookup or ownership check failed.
    #[error(transparent)]
    Workspace(#[from] WorkspaceServiceError),
    /// Task or session lookup failed.
    #[error(transparent)]
    Task(#[from] TaskServiceError),
    /// The workspace address could not be resolved.
    #[error(transparent)]
    Orchestrator(#[from] OrchestratorError),
    /// The in-pod API could not be reached.
    #[error(transparent)]
    Upstream(#[from] SidecarError),
    /// No `session_id` was supplied.
    #[error("session_id query parameter is required")]
    MissingSessionId,
    /// The supplied `session_id` is not a UUID.
    #[error("session_id is not a valid identifier: {0}")]
    InvalidSessionId(String),
}

/// Result type for relay operations.
pub type SidecarServiceResult<T> = Result<T, SidecarServiceError>;

/// Relays caller requests into the owning project's workspace.
///
/// Every operation resolves the project, checks ownership, and resolves the
/// workspace address before anything is sent upstream.
#[derive(Clone)]
pub struct SidecarProxy {
    projects: Arc<dyn ProjectAccess>,
    tasks: Arc<dyn TaskAccess>,
    relay: Arc<dyn SidecarRelay>,
    cancellations: CancellationRegistry,
}

impl SidecarProxy {
    /// Creates a proxy.
    #[must_use]
    pub const fn new(
        projects: Arc<dyn ProjectAccess>,
        tasks: Arc<dyn TaskAccess>,
        relay: Arc<dyn SidecarRelay>,
        cancellations: CancellationRegistry,
    ) -> Self {
        Self {
            projects,
            tasks,
            relay,
            cancellations,
        }
    }

    async fn address_of(&self, project: &Project) -> SidecarServiceResult<WorkspaceAddress> {
        Ok(self.projects.workspace_address(project).await?)
    }

    /// Forwards a validated file operation.
    ///
    /// Upstream statuses, including errors, are returned as-is in the
    /// [`RelayResponse`].
    ///
    /// # Errors
    ///
    /// Returns [`SidecarServiceError::Workspace`] for missing or foreign
    /// projects, [`SidecarServiceError::Orchestrator`] when the workspace
    /// has no address, and [`SidecarServiceError::Upstream`] when it is
    /// unreachable.
    pub async fn file_operation(
        &self,
        project_id: ProjectId,
        user_id: UserId,
        request: &FileRequest,
    ) -> SidecarServiceResult<RelayResponse> {
        let project = self.projects.owned_project(project_id, user_id).await?;
        let address = self.address_of(&project).await?;
        let response = self.relay.forward(&address, request).await?;
        tracing::debug!(
            project_id = %project_id,
            operation = %request.operation(),
            status = response.status,
            "file operation relayed"
        );
        Ok(response)
    }

    /// Opens the upstream file-change socket for a project.
    ///
    /// # Errors
    ///
    /// As for [`Self::file_operation`].
    pub async fn open_file_watch(
        &self,
        project_id: ProjectId,
        user_id: UserId,
    ) -> SidecarServiceResult<UpstreamSocket> {
        let project = self.projects.owned_project(project_id, user_id).await?;
        let address = self.address_of(&project).await?;
        Ok(self.relay.open_file_watch(&address).await?)
    }

    /// Opens the output stream of one of a task's sessions.
    ///
    /// `session_id` is the raw query value. It must parse and must belong to
    /// the task before any upstream connection is attempted. The stream
    /// resumes after `last_event_id` when given, else after the session's
    /// stored checkpoint, and ends when the session is stopped or settles.
    ///
    /// # Errors
    ///
    /// Returns [`SidecarServiceError::MissingSessionId`] or
    /// [`SidecarServiceError::InvalidSessionId`] for bad identifiers and
    /// [`SidecarServiceError::Task`] for sessions of other tasks, in
    /// addition to the errors of [`Self::file_operation`].
    pub async fn open_output(
        &self,
        project_id: ProjectId,
        task_id: TaskId,
        user_id: UserId,
        session_id: Option<&str>,
        last_event_id: Option<String>,
    ) -> SidecarServiceResult<RelayedStream> {
        let raw = session_id
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or(SidecarServiceError::MissingSessionId)?;
        let parsed: SessionId = raw
            .parse()
            .map_err(|_| SidecarServiceError::InvalidSessionId(raw.to_owned()))?;

        let (project, _) = self
            .tasks
            .authorize_task(project_id, task_id, user_id)
            .await?;
        let session = self.tasks.session_of_task(task_id, parsed).await?;
        let checkpoint = last_event_id
            .filter(|value| !value.trim().is_empty())
            .or_else(|| session.last_event_id().map(str::to_owned));
        let token = self.watch_session(task_id, parsed, session.is_active()).await?;

        let address = self.address_of(&project).await?;
        let upstream = self
            .relay
            .open_output_stream(&address, parsed, checkpoint)
            .await?;
        let Some(token) = token else {
            return Ok(upstream);
        };
        let RelayedStream {
            status,
            content_type,
            body,
        } = upstream;
        Ok(RelayedStream {
            status,
            content_type,
            body: body.take_until(token.cancelled_owned()).boxed(),
        })
    }

    /// Registers the stop token of an active session before going upstream.
    ///
    /// The status is read again once the token is registered. A stop that
    /// landed in between found no token to fire, so the fresh token is fired
    /// here and the session is treated as settled. Any later stop fires the
    /// registered token, including one arriving while upstream is opening.
    async fn watch_session(
        &self,
        task_id: TaskId,
        session_id: SessionId,
        active: bool,
    ) -> SidecarServiceResult<Option<CancellationToken>> {
        if !active {
            return Ok(None);
        }
        let token = self.cancellations.token(session_id);
        let current = self.tasks.session_of_task(task_id, session_id).await?;
        if current.is_active() {
            return Ok(Some(token));
        }
        self.cancellations.cancel(session_id);
        tracing::debug!(session_id = %session_id, "session settled while its stream was opening");
        Ok(None)
    }
}
