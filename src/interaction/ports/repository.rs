//! Repository port for interaction history.

use crate::interaction::domain::{Interaction, InteractionId};
use crate::session::domain::SessionId;
use crate::task::domain::TaskId;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for interaction repository operations.
pub type InteractionRepositoryResult<T> = Result<T, InteractionRepositoryError>;

/// Append-only interaction store.
#[async_trait]
pub trait InteractionRepository: Send + Sync {
    /// Appends an interaction.
    ///
    /// # Errors
    ///
    /// Returns [`InteractionRepositoryError::DuplicateInteraction`] when the
    /// identifier already exists.
    async fn append(&self, interaction: &Interaction) -> InteractionRepositoryResult<()>;

    /// Lists a task's interactions in creation order.
    ///
    /// Interactions created in the same instant keep their insertion order.
    async fn list_for_task(&self, task_id: TaskId) -> InteractionRepositoryResult<Vec<Interaction>>;

    /// Lists the interactions linked to one session, in creation order.
    async fn list_for_session(
        &self,
        session_id: SessionId,
    ) -> InteractionRepositoryResult<Vec<Interaction>>;

    /// Removes a task's whole history and returns how many entries went.
    async fn delete_for_task(&self, task_id: TaskId) -> InteractionRepositoryResult<usize>;
}

/// Errors returned by interaction repository implementations.
#[derive(Debug, Clone, Error)]
pub enum InteractionRepositoryError {
    /// An interaction with the same identifier already exists.
    #[error("duplicate interaction identifier: {0}")]
    DuplicateInteraction(InteractionId),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl InteractionRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
