//! Diesel row models for interaction persistence.

use super::schema::interactions;
use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// Row shape for reads.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = interactions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct InteractionRow {
    /// Interaction identifier.
    pub id: uuid::Uuid,
    /// Task.
    pub task_id: uuid::Uuid,
    /// Session.
    pub session_id: Option<uuid::Uuid>,
    /// Author.
    pub user_id: uuid::Uuid,
    /// Message type.
    pub message_type: String,
    /// Message text.
    pub content: String,
    /// Metadata object.
    pub metadata: serde_json::Value,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Row shape for inserts; `seq` is assigned by the database.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = interactions)]
pub struct NewInteractionRow {
    /// Interaction identifier.
    pub id: uuid::Uuid,
    /// Task.
    pub task_id: uuid::Uuid,
    /// Session.
    pub session_id: Option<uuid::Uuid>,
    /// Author.
    pub user_id: uuid::Uuid,
    /// Message type.
    pub message_type: String,
    /// Message text.
    pub content: String,
    /// Metadata object.
    pub metadata: serde_json::Value,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}
