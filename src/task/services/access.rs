//! Task and session authorisation shared by task-scoped features.

use super::error::{TaskServiceError, TaskServiceResult};
use crate::session::{
    domain::{Session, SessionId},
    ports::SessionRepository,
    services::{SessionLifecycleService, SessionServiceError},
};
use crate::task::{
    domain::{Task, TaskId},
    ports::TaskRepository,
};
use crate::workspace::{
    domain::{Project, ProjectId, UserId},
    services::ProjectAccess,
};
use async_trait::async_trait;
use mockable::Clock;
use std::sync::Arc;

/// Task lookups with ownership checks, for features that act on a task.
#[async_trait]
pub trait TaskAccess: Send + Sync {
    /// Loads a task through its project, verifying that `user_id` owns the
    /// project and that the task lives in it.
    async fn authorize_task(
        &self,
        project_id: ProjectId,
        task_id: TaskId,
        user_id: UserId,
    ) -> TaskServiceResult<(Project, Task)>;

    /// Loads a task and verifies that `user_id` owns its project.
    async fn owned_task(&self, task_id: TaskId, user_id: UserId)
    -> TaskServiceResult<(Project, Task)>;

    /// Loads a task and its project without an ownership check.
    async fn task_with_project(&self, task_id: TaskId) -> TaskServiceResult<(Project, Task)>;

    /// Loads a session and verifies that it belongs to `task_id`.
    async fn session_of_task(
        &self,
        task_id: TaskId,
        session_id: SessionId,
    ) -> TaskServiceResult<Session>;
}

/// Default [`TaskAccess`] implementation over the task repository, the
/// session lifecycle service, and project access.
pub struct TaskAuthorizer<R, S, C>
where
    R: TaskRepository + ?Sized,
    S: SessionRepository + ?Sized,
    C: Clock + Send + Sync,
{
    tasks: Arc<R>,
    sessions: Arc<SessionLifecycleService<S, C>>,
    projects: Arc<dyn ProjectAccess>,
}

impl<R, S, C> TaskAuthorizer<R, S, C>
where
    R: TaskRepository + ?Sized,
    S: SessionRepository + ?Sized,
    C: Clock + Send + Sync,
{
    /// Creates an authoriser.
    #[must_use]
    pub const fn new(
        tasks: Arc<R>,
        sessions: Arc<SessionLifecycleService<S, C>>,
        projects: Arc<dyn ProjectAccess>,
    ) -> Self {
        Self {
            tasks,
            sessions,
            projects,
        }
    }

    pub(super) const fn tasks(&self) -> &Arc<R> {
        &self.tasks
    }

    pub(super) const fn sessions(&self) -> &Arc<SessionLifecycleService<S, C>> {
        &self.sessions
    }

    pub(super) const fn projects(&self) -> &Arc<dyn ProjectAccess> {
        &self.projects
    }

    pub(super) async fn load_task(&self, task_id: TaskId) -> TaskServiceResult<Task> {
        self.tasks
            .find_by_id(task_id)
            .await?
            .ok_or(TaskServiceError::TaskNotFound(task_id))
    }
}

#[async_trait]
impl<R, S, C> TaskAccess for TaskAuthorizer<R, S, C>
where
    R: TaskRepository + ?Sized,
    S: SessionRepository + ?Sized,
    C: Clock + Send + Sync,
{
    async fn authorize_task(
        &self,
        project_id: ProjectId,
        task_id: TaskId,
        user_id: UserId,
    ) -> TaskServiceResult<(Project, Task)> {
        let project = self.projects.owned_project(project_id, user_id).await?;
        let task = self.load_task(task_id).await?;
        if task.project_id() != project.id() {
            return Err(TaskServiceError::TaskNotFound(task_id));
        }
        Ok((project, task))
    }

    async fn owned_task(
        &self,
        task_id: TaskId,
        user_id: UserId,
    ) -> TaskServiceResult<(Project, Task)> {
        let task = self.load_task(task_id).await?;
        let project = self.projects.owned_project(task.project_id(), user_id).await?;
        Ok((project, task))
    }

    async fn task_with_project(&self, task_id: TaskId) -> TaskServiceResult<(Project, Task)> {
        let task = self.load_task(task_id).await?;
        let project = self.projects.project(task.project_id()).await?;
        Ok((project, task))
    }

    async fn session_of_task(
        &self,
        task_id: TaskId,
        session_id: SessionId,
    ) -> TaskServiceResult<Session> {
        let session = self.sessions.get(session_id).await.map_err(|err| match err {
            SessionServiceError::NotFound(missing) => TaskServiceError::SessionNotFound(missing),
            other => TaskServiceError::Session(other),
        })?;
        if !session.belongs_to(task_id) {
            return Err(TaskServiceError::SessionTaskMismatch {
                session_id,
                task_id,
            });
        }
        Ok(session)
    }
}
