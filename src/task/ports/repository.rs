//! Storage contract for board tasks.
//!
//! Tasks are written whole: every state-machine step loads the task,
//! mutates the domain value, and hands the full value back to [`TaskRepository::update`].

use crate::task::domain::{Task, TaskId};
use crate::workspace::domain::ProjectId;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Outcome of a task storage call.
pub type TaskRepositoryResult<T> = Result<T, TaskRepositoryError>;

/// Durable home of the task board.
///
/// Implementations hold no business rules; the column transition table and
/// the one-running-session guard live in the domain and session layers.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Inserts a freshly created task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::DuplicateTask`] when the task ID already
    /// exists.
    async fn store(&self, task: &Task) -> TaskRepositoryResult<()>;

    /// Overwrites the stored copy of `task`, including its column, position
    /// and current session pointer.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::NotFound`] when the task does not exist.
    async fn update(&self, task: &Task) -> TaskRepositoryResult<()>;

    /// Loads a task regardless of project; callers check project membership.
    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>>;

    /// Returns a project's board in display order: ascending position, ties
    /// broken by creation time.
    async fn list_for_project(&self, project_id: ProjectId) -> TaskRepositoryResult<Vec<Task>>;

    /// Removes a task. Stored backends drop its sessions and interactions
    /// with it.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::NotFound`] when the task does not exist.
    async fn delete(&self, id: TaskId) -> TaskRepositoryResult<()>;
}

/// Failures reported by task storage.
#[derive(Debug, Clone, Error)]
pub enum TaskRepositoryError {
    /// The identifier is already taken.
    #[error("duplicate task identifier: {0}")]
    DuplicateTask(TaskId),

    /// No stored task has this identifier.
    #[error("task not found: {0}")]
    NotFound(TaskId),

    /// The backing store failed.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl TaskRepositoryError {
    /// Wraps a backend error with no task-specific meaning.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
