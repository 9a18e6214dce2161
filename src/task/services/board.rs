//! Task board: creation, listing, and column moves.

use super::access::{TaskAccess, TaskAuthorizer};
use super::error::TaskServiceResult;
use crate::session::{domain::Session, ports::SessionRepository, services::SessionServiceError};
use crate::task::{
    domain::{NewTask, Task, TaskId, TaskPriority, TaskStatus},
    ports::TaskRepository,
};
use crate::workspace::domain::{ProjectId, UserId};
use mockable::Clock;
use std::sync::Arc;

/// Request payload for creating a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTaskRequest {
    title: String,
    description: Option<String>,
    priority: Option<TaskPriority>,
    position: Option<i32>,
}

impl CreateTaskRequest {
    /// Creates a request with the required title.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            priority: None,
            position: None,
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the priority.
    #[must_use]
    pub const fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Sets the board position.
    #[must_use]
    pub const fn with_position(mut self, position: i32) -> Self {
        self.position = Some(position);
        self
    }
}

/// Board operations on a project's tasks.
pub struct TaskBoardService<R, S, C>
where
    R: TaskRepository + ?Sized,
    S: SessionRepository + ?Sized,
    C: Clock + Send + Sync,
{
    access: Arc<TaskAuthorizer<R, S, C>>,
    clock: Arc<C>,
}

impl<R, S, C> TaskBoardService<R, S, C>
where
    R: TaskRepository + ?Sized,
    S: SessionRepository + ?Sized,
    C: Clock + Send + Sync,
{
    /// Creates a board service.
    #[must_use]
    pub const fn new(access: Arc<TaskAuthorizer<R, S, C>>, clock: Arc<C>) -> Self {
        Self { access, clock }
    }

    /// Creates a task in `todo`.
    ///
    /// # Errors
    ///
    /// Returns [`super::TaskServiceError::Workspace`] when the caller does not
    /// own the project and [`super::TaskServiceError::Domain`] for invalid
    /// input.
    pub async fn create_task(
        &self,
        project_id: ProjectId,
        user_id: UserId,
        request: CreateTaskRequest,
    ) -> TaskServiceResult<Task> {
        let project = self
            .access
            .projects()
            .owned_project(project_id, user_id)
            .await?;

        let mut input = NewTask::new(project.id(), user_id, request.title)?;
        if let Some(description) = request.description {
            input = input.with_description(description);
        }
        if let Some(priority) = request.priority {
            input = input.with_priority(priority);
        }
        if let Some(position) = request.position {
            input = input.with_position(position)?;
        }

        let task = Task::new(input, &*self.clock);
        self.access.tasks().store(&task).await?;
        tracing::info!(task_id = %task.id(), project_id = %project_id, "task created");
        Ok(task)
    }

    /// Loads one task.
    ///
    /// # Errors
    ///
    /// Returns [`super::TaskServiceError::TaskNotFound`] when the task is not
    /// in the project.
    pub async fn get_task(
        &self,
        project_id: ProjectId,
        task_id: TaskId,
        user_id: UserId,
    ) -> TaskServiceResult<Task> {
        let (_, task) = self
            .access
            .authorize_task(project_id, task_id, user_id)
            .await?;
        Ok(task)
    }

    /// Lists a project's tasks in board order.
    ///
    /// # Errors
    ///
    /// Returns [`super::TaskServiceError::Workspace`] when the caller does not
    /// own the project.
    pub async fn list_tasks(
        &self,
        project_id: ProjectId,
        user_id: UserId,
    ) -> TaskServiceResult<Vec<Task>> {
        let project = self
            .access
            .projects()
            .owned_project(project_id, user_id)
            .await?;
        Ok(self.access.tasks().list_for_project(project.id()).await?)
    }

    /// Moves a task to another column and position.
    ///
    /// A task with a pending or running session cannot leave `in_progress`;
    /// it has to be stopped first.
    ///
    /// # Errors
    ///
    /// Returns [`super::TaskServiceError::Domain`] for transitions outside
    /// the board table and [`super::TaskServiceError::Session`] when an active
    /// session pins the task.
    pub async fn move_task(
        &self,
        project_id: ProjectId,
        task_id: TaskId,
        user_id: UserId,
        status: TaskStatus,
        position: i32,
    ) -> TaskServiceResult<Task> {
        let (_, mut task) = self
            .access
            .authorize_task(project_id, task_id, user_id)
            .await?;

        if task.status() == TaskStatus::InProgress
            && status != TaskStatus::InProgress
            && self
                .access
                .sessions()
                .active_for_task(task_id)
                .await?
                .is_some()
        {
            return Err(SessionServiceError::SessionAlreadyActive(task_id).into());
        }

        task.move_to(status, position, &*self.clock)?;
        self.access.tasks().update(&task).await?;
        tracing::info!(task_id = %task_id, status = %status, position, "task moved");
        Ok(task)
    }

    /// Lists a task's execution sessions, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`super::TaskServiceError::TaskNotFound`] when the task is not
    /// in the project.
    pub async fn task_sessions(
        &self,
        project_id: ProjectId,
        task_id: TaskId,
        user_id: UserId,
    ) -> TaskServiceResult<Vec<Session>> {
        self.access
            .authorize_task(project_id, task_id, user_id)
            .await?;
        Ok(self.access.sessions().list_for_task(task_id).await?)
    }

    /// Lists the pending or running sessions across a project, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`super::TaskServiceError::Workspace`] when the caller does not
    /// own the project.
    pub async fn active_project_sessions(
        &self,
        project_id: ProjectId,
        user_id: UserId,
    ) -> TaskServiceResult<Vec<Session>> {
        let project = self
            .access
            .projects()
            .owned_project(project_id, user_id)
            .await?;
        Ok(self
            .access
            .sessions()
            .list_active_for_project(project.id())
            .await?)
    }

    /// Deletes a task with no pending or running session.
    ///
    /// # Errors
    ///
    /// Returns [`super::TaskServiceError::TaskNotFound`] when the task is not
    /// in the project and [`super::TaskServiceError::Session`] while a
    /// session is active; stop it first.
    pub async fn delete_task(
        &self,
        project_id: ProjectId,
        task_id: TaskId,
        user_id: UserId,
    ) -> TaskServiceResult<()> {
        self.access
            .authorize_task(project_id, task_id, user_id)
            .await?;
        if self
            .access
            .sessions()
            .active_for_task(task_id)
            .await?
            .is_some()
        {
            return Err(SessionServiceError::SessionAlreadyActive(task_id).into());
        }
        self.access.tasks().delete(task_id).await?;
        tracing::info!(task_id = %task_id, project_id = %project_id, "task deleted");
        Ok(())
    }
}
