//! In-memory repository for interaction history.

use crate::interaction::{
    domain::Interaction,
    ports::{InteractionRepository, InteractionRepositoryError, InteractionRepositoryResult},
};
use crate::session::domain::SessionId;
use crate::task::domain::TaskId;
use async_trait::async_trait;
use std::sync::{Arc, RwLock};

/// Thread-safe in-memory interaction log.
#[derive(Debug, Clone, Default)]
pub struct InMemoryInteractionRepository {
    log: Arc<RwLock<Vec<Interaction>>>,
}

impl InMemoryInteractionRepository {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_error(err: &impl std::fmt::Display) -> InteractionRepositoryError {
    InteractionRepositoryError::persistence(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl InteractionRepository for InMemoryInteractionRepository {
    async fn append(&self, interaction: &Interaction) -> InteractionRepositoryResult<()> {
        let mut log = self.log.write().map_err(|err| lock_error(&err))?;
        if log.iter().any(|existing| existing.id() == interaction.id()) {
            return Err(InteractionRepositoryError::DuplicateInteraction(
                interaction.id(),
            ));
        }
        log.push(interaction.clone());
        Ok(())
    }

    async fn list_for_task(&self, task_id: TaskId) -> InteractionRepositoryResult<Vec<Interaction>> {
        let log = self.log.read().map_err(|err| lock_error(&err))?;
        let mut found: Vec<Interaction> = log
            .iter()
            .filter(|interaction| interaction.task_id() == task_id)
            .cloned()
            .collect();
        found.sort_by_key(Interaction::created_at);
        Ok(found)
    }

    async fn list_for_session(
        &self,
        session_id: SessionId,
    ) -> InteractionRepositoryResult<Vec<Interaction>> {
        let log = self.log.read().map_err(|err| lock_error(&err))?;
        let mut found: Vec<Interaction> = log
            .iter()
            .filter(|interaction| interaction.session_id() == Some(session_id))
            .cloned()
            .collect();
        found.sort_by_key(Interaction::created_at);
        Ok(found)
    }

    async fn delete_for_task(&self, task_id: TaskId) -> InteractionRepositoryResult<usize> {
        let mut log = self.log.write().map_err(|err| lock_error(&err))?;
        let before = log.len();
        log.retain(|interaction| interaction.task_id() != task_id);
        Ok(before - log.len())
    }
}
