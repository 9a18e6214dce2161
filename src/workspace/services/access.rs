//! Project access capability shared with other features.

use super::lifecycle::{WorkspaceService, WorkspaceServiceResult};
use crate::workspace::{
    domain::{Project, ProjectId, UserId, WorkspaceAddress},
    ports::{OrchestratorResult, ProjectRepository, WorkspaceOrchestrator},
};
use async_trait::async_trait;
use mockable::Clock;

/// Ownership checks and address resolution for features that act on a
/// project's workspace.
#[async_trait]
pub trait ProjectAccess: Send + Sync {
    /// Loads a project and verifies that `user_id` owns it.
    async fn owned_project(
        &self,
        project_id: ProjectId,
        user_id: UserId,
    ) -> WorkspaceServiceResult<Project>;

    /// Loads a project without an ownership check.
    async fn project(&self, project_id: ProjectId) -> WorkspaceServiceResult<Project>;

    /// Resolves the network address of the project's workspace.
    async fn workspace_address(&self, project: &Project) -> OrchestratorResult<WorkspaceAddress>;
}

#[async_trait]
impl<R, O, C> ProjectAccess for WorkspaceService<R, O, C>
where
    R: ProjectRepository + ?Sized,
    O: WorkspaceOrchestrator + ?Sized + 'static,
    C: Clock + Send + Sync,
{
    async fn owned_project(
        &self,
        project_id: ProjectId,
        user_id: UserId,
    ) -> WorkspaceServiceResult<Project> {
        self.get_project(project_id, user_id).await
    }

    async fn project(&self, project_id: ProjectId) -> WorkspaceServiceResult<Project> {
        self.find_project(project_id).await
    }

    async fn workspace_address(&self, project: &Project) -> OrchestratorResult<WorkspaceAddress> {
        self.resolve_address(project).await
    }
}
