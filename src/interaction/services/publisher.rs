//! Producer-side publishing of agent and system messages.

use super::service::InteractionServiceResult;
use crate::interaction::domain::{Interaction, MessageType};
use crate::session::domain::SessionId;
use crate::task::domain::TaskId;
use async_trait::async_trait;
use serde_json::Value;

/// A message produced by the agent or the control plane.
#[derive(Debug, Clone, PartialEq)]
pub struct ProducerMessage {
    /// Task the message is about.
    pub task_id: TaskId,
    /// Session the message came from.
    pub session_id: Option<SessionId>,
    /// Message type.
    pub message_type: MessageType,
    /// Message text.
    pub content: String,
    /// Metadata object.
    pub metadata: Value,
}

impl ProducerMessage {
    fn new(
        task_id: TaskId,
        session_id: Option<SessionId>,
        message_type: MessageType,
        content: impl Into<String>,
    ) -> Self {
        Self {
            task_id,
            session_id,
            message_type,
            content: content.into(),
            metadata: Value::Null,
        }
    }

    /// Agent output for a session.
    #[must_use]
    pub fn agent_response(
        task_id: TaskId,
        session_id: SessionId,
        content: impl Into<String>,
    ) -> Self {
        Self::new(task_id, Some(session_id), MessageType::AgentResponse, content)
    }

    /// Lifecycle notice.
    #[must_use]
    pub fn system_notification(
        task_id: TaskId,
        session_id: Option<SessionId>,
        content: impl Into<String>,
    ) -> Self {
        Self::new(task_id, session_id, MessageType::SystemNotification, content)
    }

    /// Failure notice.
    #[must_use]
    pub fn error(task_id: TaskId, session_id: Option<SessionId>, content: impl Into<String>) -> Self {
        Self::new(task_id, session_id, MessageType::Error, content)
    }

    /// Attaches metadata.
    #[must_use]
    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Persists and broadcasts producer messages.
#[async_trait]
pub trait InteractionPublisher: Send + Sync {
    /// Persists `message` under the project owner and broadcasts it to
    /// every connection of its task.
    async fn publish(&self, message: ProducerMessage) -> InteractionServiceResult<Interaction>;
}
