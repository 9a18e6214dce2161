//! Board storage held in process memory, used by tests and local runs.

use async_trait::async_trait;
use std::collections::{HashMap, hash_map::Entry};
use std::sync::{Arc, RwLock};

use crate::task::{
    domain::{Task, TaskId},
    ports::{TaskRepository, TaskRepositoryError, TaskRepositoryResult},
};
use crate::workspace::domain::ProjectId;

/// Task board kept in a shared map; clones see the same tasks.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskRepository {
    state: Arc<RwLock<HashMap<TaskId, Task>>>,
}

impl InMemoryTaskRepository {
    /// Creates an empty board store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_error(err: &impl std::fmt::Display) -> TaskRepositoryError {
    TaskRepositoryError::persistence(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn store(&self, task: &Task) -> TaskRepositoryResult<()> {
        let mut tasks = self.state.write().map_err(|err| lock_error(&err))?;
        match tasks.entry(task.id()) {
            Entry::Occupied(_) => Err(TaskRepositoryError::DuplicateTask(task.id())),
            Entry::Vacant(slot) => {
                slot.insert(task.clone());
                Ok(())
            }
        }
    }

    async fn update(&self, task: &Task) -> TaskRepositoryResult<()> {
        let mut tasks = self.state.write().map_err(|err| lock_error(&err))?;
        match tasks.get_mut(&task.id()) {
            Some(stored) => {
                stored.clone_from(task);
                Ok(())
            }
            None => Err(TaskRepositoryError::NotFound(task.id())),
        }
    }

    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>> {
        let tasks = self.state.read().map_err(|err| lock_error(&err))?;
        Ok(tasks.get(&id).cloned())
    }

    async fn list_for_project(&self, project_id: ProjectId) -> TaskRepositoryResult<Vec<Task>> {
        let tasks = self.state.read().map_err(|err| lock_error(&err))?;
        let mut board: Vec<Task> = tasks
            .values()
            .filter(|task| task.project_id() == project_id)
            .cloned()
            .collect();
        board.sort_by_key(|task| (task.position(), task.created_at()));
        Ok(board)
    }

    async fn delete(&self, id: TaskId) -> TaskRepositoryResult<()> {
        let mut tasks = self.state.write().map_err(|err| lock_error(&err))?;
        tasks
            .remove(&id)
            .map(drop)
            .ok_or(TaskRepositoryError::NotFound(id))
    }
}
