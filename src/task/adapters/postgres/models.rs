//! Diesel row shape of the `tasks` table.

use super::schema::tasks;
use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// One board card as stored. Enum columns hold their snake_case names.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = tasks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub struct TaskRow {
    /// Primary key.
    pub id: uuid::Uuid,
    /// Project whose board shows the card.
    pub project_id: uuid::Uuid,
    /// Card title, never blank.
    pub title: String,
    /// Free-text body, if any.
    pub description: Option<String>,
    /// Column name such as `todo` or `ai_review`.
    pub status: String,
    /// Sort key within the board.
    pub position: i32,
    /// `low`, `medium` or `high`.
    pub priority: String,
    /// Session most recently started for the card.
    pub current_session_id: Option<uuid::Uuid>,
    /// User who added the card.
    pub created_by: uuid::Uuid,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}
