//! Interaction record and message types.

use super::{InteractionDomainError, InteractionId, ParseMessageTypeError};
use crate::session::domain::SessionId;
use crate::task::domain::TaskId;
use crate::workspace::domain::UserId;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Maximum characters in a message typed by a user.
pub const MAX_USER_MESSAGE_CHARS: usize = 2000;

/// Maximum characters in an agent or system message.
pub const MAX_PRODUCER_MESSAGE_CHARS: usize = 50_000;

/// Who produced an interaction and how clients should render it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    /// Typed by a connected user.
    UserMessage,
    /// Produced by the agent.
    AgentResponse,
    /// Lifecycle notice from the control plane.
    SystemNotification,
    /// Failure notice.
    Error,
}

impl MessageType {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::UserMessage => "user_message",
            Self::AgentResponse => "agent_response",
            Self::SystemNotification => "system_notification",
            Self::Error => "error",
        }
    }

    /// Returns the content limit for this type.
    #[must_use]
    pub const fn max_chars(self) -> usize {
        match self {
            Self::UserMessage => MAX_USER_MESSAGE_CHARS,
            Self::AgentResponse | Self::SystemNotification | Self::Error => {
                MAX_PRODUCER_MESSAGE_CHARS
            }
        }
    }
}

impl FromStr for MessageType {
    type Err = ParseMessageTypeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "user_message" => Ok(Self::UserMessage),
            "agent_response" => Ok(Self::AgentResponse),
            "system_notification" => Ok(Self::SystemNotification),
            "error" => Ok(Self::Error),
            _ => Err(ParseMessageTypeError(value.to_owned())),
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validated input for a new interaction.
#[derive(Debug, Clone, PartialEq)]
pub struct NewInteraction {
    task_id: TaskId,
    session_id: Option<SessionId>,
    user_id: UserId,
    message_type: MessageType,
    content: String,
    metadata: Map<String, Value>,
}

impl NewInteraction {
    /// Validates content against the limits of `message_type`.
    ///
    /// # Errors
    ///
    /// Returns [`InteractionDomainError::EmptyContent`] for blank content and
    /// [`InteractionDomainError::ContentTooLong`] above the type's limit.
    pub fn new(
        task_id: TaskId,
        user_id: UserId,
        message_type: MessageType,
        content: impl Into<String>,
    ) -> Result<Self, InteractionDomainError> {
        let text = content.into();
        if text.trim().is_empty() {
            return Err(InteractionDomainError::EmptyContent);
        }
        let length = text.chars().count();
        let max = message_type.max_chars();
        if length > max {
            return Err(InteractionDomainError::ContentTooLong {
                message_type,
                length,
                max,
            });
        }
        Ok(Self {
            task_id,
            session_id: None,
            user_id,
            message_type,
            content: text,
            metadata: Map::new(),
        })
    }

    /// Links the interaction to an execution session.
    #[must_use]
    pub const fn with_session(mut self, session_id: SessionId) -> Self {
        self.session_id = Some(session_id);
        self
    }

    /// Attaches metadata; `null` leaves it empty.
    ///
    /// # Errors
    ///
    /// Returns [`InteractionDomainError::MetadataNotObject`] for arrays and
    /// scalars.
    pub fn with_metadata(mut self, metadata: Value) -> Result<Self, InteractionDomainError> {
        match metadata {
            Value::Object(map) => self.metadata = map,
            Value::Null => self.metadata = Map::new(),
            _ => return Err(InteractionDomainError::MetadataNotObject),
        }
        Ok(self)
    }
}

/// One persisted message about a task.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Interaction {
    id: InteractionId,
    task_id: TaskId,
    session_id: Option<SessionId>,
    user_id: UserId,
    message_type: MessageType,
    content: String,
    metadata: Map<String, Value>,
    created_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted interaction.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistedInteractionData {
    /// Interaction identifier.
    pub id: InteractionId,
    /// Task the message is about.
    pub task_id: TaskId,
    /// Execution session, when produced during a run.
    pub session_id: Option<SessionId>,
    /// Author, or the project owner for agent and system messages.
    pub user_id: UserId,
    /// Message type.
    pub message_type: MessageType,
    /// Message text.
    pub content: String,
    /// Free-form metadata object.
    pub metadata: Map<String, Value>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Interaction {
    /// Stamps a validated message with an identifier and creation time.
    #[must_use]
    pub fn new(input: NewInteraction, clock: &impl Clock) -> Self {
        Self {
            id: InteractionId::new(),
            task_id: input.task_id,
            session_id: input.session_id,
            user_id: input.user_id,
            message_type: input.message_type,
            content: input.content,
            metadata: input.metadata,
            created_at: clock.utc(),
        }
    }

    /// Reconstructs an interaction from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedInteractionData) -> Self {
        Self {
            id: data.id,
            task_id: data.task_id,
            session_id: data.session_id,
            user_id: data.user_id,
            message_type: data.message_type,
            content: data.content,
            metadata: data.metadata,
            created_at: data.created_at,
        }
    }

    /// Returns the identifier.
    #[must_use]
    pub const fn id(&self) -> InteractionId {
        self.id
    }

    /// Returns the task.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Returns the execution session, if any.
    #[must_use]
    pub const fn session_id(&self) -> Option<SessionId> {
        self.session_id
    }

    /// Returns the author.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Returns the message type.
    #[must_use]
    pub const fn message_type(&self) -> MessageType {
        self.message_type
    }

    /// Returns the message text.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Returns the metadata object.
    #[must_use]
    pub const fn metadata(&self) -> &Map<String, Value> {
        &self.metadata
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
