//! Interaction persistence and fan-out.

use super::hub::BroadcastHub;
use super::publisher::{InteractionPublisher, ProducerMessage};
use crate::interaction::{
    domain::{Interaction, InteractionDomainError, MessageType, NewInteraction, ServerFrame},
    ports::{InteractionRepository, InteractionRepositoryError},
};
use crate::session::domain::SessionId;
use crate::task::domain::TaskId;
use crate::task::services::{TaskAccess, TaskServiceError};
use crate::workspace::domain::{ProjectId, UserId};
use async_trait::async_trait;
use mockable::Clock;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

/// Service-level errors for interaction operations.
#[derive(Debug, Error)]
pub enum InteractionServiceError {
    /// Message validation failed.
    #[error(transparent)]
    Domain(#[from] InteractionDomainError),
    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] InteractionRepositoryError),
    /// The task, project, or session could not be accessed.
    #[error(transparent)]
    Access(#[from] TaskServiceError),
}

/// Result type for interaction service operations.
pub type InteractionServiceResult<T> = Result<T, InteractionServiceError>;

/// Persists interactions and pushes them through the hub.
pub struct InteractionService<R, C>
where
    R: InteractionRepository + ?Sized,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    tasks: Arc<dyn TaskAccess>,
    hub: BroadcastHub,
    clock: Arc<C>,
}

impl<R, C> InteractionService<R, C>
where
    R: InteractionRepository + ?Sized,
    C: Clock + Send + Sync,
{
    /// Creates an interaction service.
    #[must_use]
    pub const fn new(
        repository: Arc<R>,
        tasks: Arc<dyn TaskAccess>,
        hub: BroadcastHub,
        clock: Arc<C>,
    ) -> Self {
        Self {
            repository,
            tasks,
            hub,
            clock,
        }
    }

    /// Returns the connection registry.
    #[must_use]
    pub const fn hub(&self) -> &BroadcastHub {
        &self.hub
    }

    /// Returns the clock used to stamp frames.
    #[must_use]
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Verifies that `user_id` may open an interaction session on a task.
    ///
    /// # Errors
    ///
    /// Returns [`InteractionServiceError::Access`] when the task is missing
    /// or the caller does not own its project.
    pub async fn authorize(&self, task_id: TaskId, user_id: UserId) -> InteractionServiceResult<()> {
        self.tasks.owned_task(task_id, user_id).await?;
        Ok(())
    }

    /// Returns a task's history in creation order.
    ///
    /// # Errors
    ///
    /// Returns [`InteractionServiceError::Repository`] when the lookup fails.
    pub async fn history(&self, task_id: TaskId) -> InteractionServiceResult<Vec<Interaction>> {
        Ok(self.repository.list_for_task(task_id).await?)
    }

    /// Lists a task's interactions for its project owner.
    ///
    /// # Errors
    ///
    /// Returns [`InteractionServiceError::Access`] when the task is not in
    /// the project or the caller does not own it.
    pub async fn list_interactions(
        &self,
        project_id: ProjectId,
        task_id: TaskId,
        user_id: UserId,
    ) -> InteractionServiceResult<Vec<Interaction>> {
        self.tasks
            .authorize_task(project_id, task_id, user_id)
            .await?;
        self.history(task_id).await
    }

    /// Lists the interactions linked to one of a task's sessions.
    ///
    /// # Errors
    ///
    /// Returns [`InteractionServiceError::Access`] when the caller does not
    /// own the task or the session belongs to another task.
    pub async fn session_interactions(
        &self,
        project_id: ProjectId,
        task_id: TaskId,
        session_id: SessionId,
        user_id: UserId,
    ) -> InteractionServiceResult<Vec<Interaction>> {
        self.tasks
            .authorize_task(project_id, task_id, user_id)
            .await?;
        self.tasks.session_of_task(task_id, session_id).await?;
        Ok(self.repository.list_for_session(session_id).await?)
    }

    /// Deletes a task's interaction history.
    ///
    /// Live connections stay open; they only see messages sent afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`InteractionServiceError::Access`] when the caller does not
    /// own the task.
    pub async fn clear_history(
        &self,
        project_id: ProjectId,
        task_id: TaskId,
        user_id: UserId,
    ) -> InteractionServiceResult<usize> {
        self.tasks
            .authorize_task(project_id, task_id, user_id)
            .await?;
        let removed = self.repository.delete_for_task(task_id).await?;
        tracing::info!(task_id = %task_id, removed, "interaction history cleared");
        Ok(removed)
    }

    /// Persists a message typed by a connected user and broadcasts it to
    /// every connection of the task, the sender included.
    ///
    /// # Errors
    ///
    /// Returns [`InteractionServiceError::Domain`] for invalid content or
    /// metadata.
    pub async fn post_user_message(
        &self,
        task_id: TaskId,
        user_id: UserId,
        content: String,
        metadata: Value,
    ) -> InteractionServiceResult<Interaction> {
        let input = NewInteraction::new(task_id, user_id, MessageType::UserMessage, content)?
            .with_metadata(metadata)?;
        self.record(input).await
    }

    async fn record(&self, input: NewInteraction) -> InteractionServiceResult<Interaction> {
        let interaction = Interaction::new(input, &*self.clock);
        self.repository.append(&interaction).await?;
        let delivered = self
            .hub
            .broadcast(interaction.task_id(), &ServerFrame::from(&interaction));
        tracing::debug!(
            task_id = %interaction.task_id(),
            interaction_id = %interaction.id(),
            message_type = %interaction.message_type(),
            delivered,
            "interaction broadcast"
        );
        Ok(interaction)
    }
}

#[async_trait]
impl<R, C> InteractionPublisher for InteractionService<R, C>
where
    R: InteractionRepository + ?Sized,
    C: Clock + Send + Sync,
{
    async fn publish(&self, message: ProducerMessage) -> InteractionServiceResult<Interaction> {
        let ProducerMessage {
            task_id,
            session_id,
            message_type,
            content,
            metadata,
        } = message;

        let (project, _) = self.tasks.task_with_project(task_id).await?;
        let mut input = NewInteraction::new(task_id, project.owner_id(), message_type, content)?
            .with_metadata(metadata)?;
        if let Some(id) = session_id {
            self.tasks.session_of_task(task_id, id).await?;
            input = input.with_session(id);
        }
        self.record(input).await
    }
}
