//! JSON frames exchanged over the interaction socket.

use super::{Interaction, InteractionId, MessageType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One message as clients see it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessageFrame {
    /// Message type.
    #[serde(rename = "type")]
    pub message_type: MessageType,
    /// Message text.
    pub content: String,
    /// Metadata object, omitted when empty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
    /// Creation time.
    pub timestamp: DateTime<Utc>,
    /// Interaction identifier; absent on transient error frames.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<InteractionId>,
}

impl MessageFrame {
    /// Builds a transient error frame that is never persisted.
    #[must_use]
    pub fn error(content: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            message_type: MessageType::Error,
            content: content.into(),
            metadata: None,
            timestamp,
            id: None,
        }
    }
}

impl From<&Interaction> for MessageFrame {
    fn from(interaction: &Interaction) -> Self {
        let metadata = if interaction.metadata().is_empty() {
            None
        } else {
            Some(Value::Object(interaction.metadata().clone()))
        };
        Self {
            message_type: interaction.message_type(),
            content: interaction.content().to_owned(),
            metadata,
            timestamp: interaction.created_at(),
            id: Some(interaction.id()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum BatchKind {
    History,
}

/// Prior interactions sent as one `{"type": "history", "messages": [...]}`
/// frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryBatch {
    #[serde(rename = "type")]
    kind: BatchKind,
    messages: Vec<MessageFrame>,
}

impl HistoryBatch {
    /// Returns the batched messages, oldest first.
    #[must_use]
    pub fn messages(&self) -> &[MessageFrame] {
        &self.messages
    }
}

/// Frame sent from the server to a client.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ServerFrame {
    /// Prior interactions, oldest first.
    History(HistoryBatch),
    /// A single live message.
    Message(MessageFrame),
}

impl ServerFrame {
    /// Builds the history batch for a freshly opened connection.
    #[must_use]
    pub fn history(interactions: &[Interaction]) -> Self {
        Self::History(HistoryBatch {
            kind: BatchKind::History,
            messages: interactions.iter().map(MessageFrame::from).collect(),
        })
    }

    /// Returns the interaction identifier of a live message.
    #[must_use]
    pub const fn interaction_id(&self) -> Option<InteractionId> {
        match self {
            Self::History(_) => None,
            Self::Message(frame) => frame.id,
        }
    }

    /// Serialises the frame as JSON text.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error when serialisation fails.
    pub fn to_text(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl From<&Interaction> for ServerFrame {
    fn from(interaction: &Interaction) -> Self {
        Self::Message(MessageFrame::from(interaction))
    }
}

/// Raw client frame: `{type, content, metadata, timestamp}`.
///
/// The client timestamp is accepted and ignored; the server stamps
/// persisted messages itself.
#[derive(Debug, Deserialize)]
struct ClientFrame {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    metadata: Value,
}

/// What a client frame asks the server to do.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientCommand {
    /// Persist and broadcast a user message.
    UserMessage {
        /// Message text.
        content: String,
        /// Client-supplied metadata.
        metadata: Value,
    },
    /// A well-formed frame of a type clients may not send.
    Unsupported(String),
    /// Text that is not a JSON frame.
    Malformed,
}

impl ClientCommand {
    /// Interprets one inbound text frame.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        match serde_json::from_str::<ClientFrame>(text) {
            Ok(frame) if frame.kind == MessageType::UserMessage.as_str() => Self::UserMessage {
                content: frame.content,
                metadata: frame.metadata,
            },
            Ok(frame) => Self::Unsupported(frame.kind),
            Err(_) => Self::Malformed,
        }
    }
}
