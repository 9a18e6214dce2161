//! Service layer for project creation, deletion, and workspace observation.

use crate::workspace::{
    domain::{
        NewProject, PodPhase, PodRef, Project, ProjectId, UserId, WorkspaceAddress,
        WorkspaceDomainError,
    },
    ports::{
        OrchestratorError, OrchestratorResult, ProjectRepository, ProjectRepositoryError,
        WorkspaceOrchestrator,
    },
};
use futures::StreamExt;
use futures::stream::BoxStream;
use mockable::Clock;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Request payload for creating a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateProjectRequest {
    owner_id: UserId,
    name: String,
    description: Option<String>,
}

impl CreateProjectRequest {
    /// Creates a request with the required fields.
    #[must_use]
    pub fn new(owner_id: UserId, name: impl Into<String>) -> Self {
        Self {
            owner_id,
            name: name.into(),
            description: None,
        }
    }

    /// Sets the project description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Tunables for workspace provisioning and observation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceSettings {
    /// Orchestrator namespace in which workspaces are created.
    pub namespace: String,
    /// Interval between polls while watching a workspace.
    pub poll_interval: Duration,
}

impl Default for WorkspaceSettings {
    fn default() -> Self {
        Self {
            namespace: "opencode".to_owned(),
            poll_interval: Duration::from_secs(2),
        }
    }
}

/// Result of project creation.
///
/// The project is always persisted. A provisioning failure is reported
/// alongside it instead of failing the operation.
#[derive(Debug, Clone)]
pub struct ProvisionOutcome {
    /// Persisted project in its post-provisioning state.
    pub project: Project,
    /// Orchestrator failure encountered while provisioning, if any.
    pub provisioning_error: Option<OrchestratorError>,
}

/// Service-level errors for workspace lifecycle operations.
#[derive(Debug, Error)]
pub enum WorkspaceServiceError {
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] WorkspaceDomainError),
    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] ProjectRepositoryError),
    /// Orchestrator operation failed.
    #[error(transparent)]
    Orchestrator(#[from] OrchestratorError),
    /// The project does not exist.
    #[error("project not found: {0}")]
    NotFound(ProjectId),
    /// The caller does not own the project.
    #[error("access to project {0} is forbidden")]
    Forbidden(ProjectId),
}

/// Result type for workspace service operations.
pub type WorkspaceServiceResult<T> = Result<T, WorkspaceServiceError>;

/// Project and workspace lifecycle orchestration service.
#[derive(Clone)]
pub struct WorkspaceService<R, O, C>
where
    R: ProjectRepository + ?Sized,
    O: WorkspaceOrchestrator + ?Sized,
    C: Clock + Send + Sync,
{
    projects: Arc<R>,
    orchestrator: Arc<O>,
    clock: Arc<C>,
    settings: WorkspaceSettings,
}

impl<R, O, C> WorkspaceService<R, O, C>
where
    R: ProjectRepository + ?Sized,
    O: WorkspaceOrchestrator + ?Sized + 'static,
    C: Clock + Send + Sync,
{
    /// Creates a new workspace service.
    #[must_use]
    pub const fn new(
        projects: Arc<R>,
        orchestrator: Arc<O>,
        clock: Arc<C>,
        settings: WorkspaceSettings,
    ) -> Self {
        Self {
            projects,
            orchestrator,
            clock,
            settings,
        }
    }

    /// Creates a project and provisions its workspace.
    ///
    /// The project row is written before provisioning starts, so a record
    /// exists even when provisioning fails. The final status (`ready` or
    /// `error`) is persisted before returning.
    ///
    /// # Errors
    ///
    /// Returns [`WorkspaceServiceError::Domain`] for invalid input and
    /// [`WorkspaceServiceError::Repository`] when persistence fails.
    /// Orchestrator failures are reported through
    /// [`ProvisionOutcome::provisioning_error`].
    pub async fn create_project(
        &self,
        request: CreateProjectRequest,
    ) -> WorkspaceServiceResult<ProvisionOutcome> {
        let mut input = NewProject::new(request.owner_id, request.name)?;
        if let Some(description) = request.description {
            input = input.with_description(description);
        }

        let mut project = Project::new(input, &self.settings.namespace, &*self.clock);
        self.projects.store(&project).await?;

        let provisioning_error = match self.orchestrator.provision(&project.workspace_spec()).await
        {
            Ok(()) => {
                project.mark_provisioned(&*self.clock)?;
                tracing::info!(project_id = %project.id(), pod = %project.pod(), "project workspace provisioned");
                None
            }
            Err(err) => {
                project.mark_provisioning_failed(&err.to_string(), &*self.clock)?;
                tracing::warn!(project_id = %project.id(), error = %err, "project workspace provisioning failed");
                Some(err)
            }
        };

        self.projects.update(&project).await?;
        Ok(ProvisionOutcome {
            project,
            provisioning_error,
        })
    }

    /// Loads a project owned by `user_id`.
    ///
    /// # Errors
    ///
    /// Returns [`WorkspaceServiceError::NotFound`] when the project does not
    /// exist and [`WorkspaceServiceError::Forbidden`] when another user owns
    /// it.
    pub async fn get_project(
        &self,
        project_id: ProjectId,
        user_id: UserId,
    ) -> WorkspaceServiceResult<Project> {
        let project = self.find_project(project_id).await?;
        if !project.is_owned_by(user_id) {
            return Err(WorkspaceServiceError::Forbidden(project_id));
        }
        Ok(project)
    }

    /// Loads a project without an ownership check.
    ///
    /// # Errors
    ///
    /// Returns [`WorkspaceServiceError::NotFound`] when the project does not
    /// exist.
    pub async fn find_project(&self, project_id: ProjectId) -> WorkspaceServiceResult<Project> {
        self.projects
            .find_by_id(project_id)
            .await?
            .ok_or(WorkspaceServiceError::NotFound(project_id))
    }

    /// Lists the caller's projects, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`WorkspaceServiceError::Repository`] when the lookup fails.
    pub async fn list_projects(&self, user_id: UserId) -> WorkspaceServiceResult<Vec<Project>> {
        Ok(self.projects.list_for_owner(user_id).await?)
    }

    /// Tears down the workspace and deletes the project.
    ///
    /// Deleting the row cascades to tasks, sessions, interactions, and
    /// configuration versions. A teardown failure aborts the deletion so the
    /// record keeps pointing at the live resources.
    ///
    /// # Errors
    ///
    /// Returns [`WorkspaceServiceError::Orchestrator`] when teardown fails,
    /// plus the errors of [`Self::get_project`].
    pub async fn delete_project(
        &self,
        project_id: ProjectId,
        user_id: UserId,
    ) -> WorkspaceServiceResult<()> {
        let project = self.get_project(project_id, user_id).await?;
        self.orchestrator
            .teardown(project.pod(), project.volume_name())
            .await?;
        self.projects.delete(project_id).await?;
        tracing::info!(project_id = %project_id, "project deleted");
        Ok(())
    }

    /// Resolves the network address of the project's workspace.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::NotFound`] or
    /// [`OrchestratorError::NotReady`] so callers can tell a missing
    /// workspace from one still starting.
    pub async fn resolve_address(&self, project: &Project) -> OrchestratorResult<WorkspaceAddress> {
        self.orchestrator.resolve_address(project.pod()).await
    }

    /// Polls the live workspace phase and records it on the project.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`Self::get_project`], and
    /// [`WorkspaceServiceError::Orchestrator`] when polling fails.
    pub async fn poll_status(
        &self,
        project_id: ProjectId,
        user_id: UserId,
    ) -> WorkspaceServiceResult<PodPhase> {
        let mut project = self.get_project(project_id, user_id).await?;
        let phase = self.orchestrator.pod_status(project.pod()).await?;
        if project.pod_status() != Some(phase) {
            project.record_pod_phase(phase, &*self.clock);
            self.projects.update(&project).await?;
        }
        Ok(phase)
    }

    /// Watches the workspace phase.
    ///
    /// The stream polls at the configured interval and yields only when the
    /// phase changes. Once the resource disappears it yields
    /// [`PodPhase::Deleted`] and ends. An orchestrator error is yielded once
    /// and also ends the stream.
    #[must_use]
    pub fn watch_status(
        &self,
        project: &Project,
    ) -> BoxStream<'static, OrchestratorResult<PodPhase>> {
        let watch = WatchState {
            orchestrator: Arc::clone(&self.orchestrator),
            pod: project.pod().clone(),
            interval: self.settings.poll_interval,
            last: None,
            polled: false,
            finished: false,
        };
        futures::stream::unfold(watch, next_phase).boxed()
    }
}

struct WatchState<O: ?Sized> {
    orchestrator: Arc<O>,
    pod: PodRef,
    interval: Duration,
    last: Option<PodPhase>,
    polled: bool,
    finished: bool,
}

async fn next_phase<O>(
    mut watch: WatchState<O>,
) -> Option<(OrchestratorResult<PodPhase>, WatchState<O>)>
where
    O: WorkspaceOrchestrator + ?Sized,
{
    if watch.finished {
        return None;
    }
    loop {
        if watch.polled {
            tokio::time::sleep(watch.interval).await;
        }
        watch.polled = true;

        match watch.orchestrator.pod_status(&watch.pod).await {
            Ok(phase) if phase.is_gone() => {
                watch.finished = true;
                return Some((Ok(PodPhase::Deleted), watch));
            }
            Ok(phase) if watch.last == Some(phase) => {}
            Ok(phase) => {
                watch.last = Some(phase);
                return Some((Ok(phase), watch));
            }
            Err(err) => {
                watch.finished = true;
                return Some((Err(err), watch));
            }
        }
    }
}
