//! Diesel row models for session persistence.

use super::schema::sessions;
use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// Row shape shared by reads, inserts, and full-row updates.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = sessions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub struct SessionRow {
    /// Session identifier.
    pub id: uuid::Uuid,
    /// Executed task.
    pub task_id: uuid::Uuid,
    /// Owning project.
    pub project_id: uuid::Uuid,
    /// Session status.
    pub status: String,
    /// Prompt.
    pub prompt: String,
    /// Accumulated output.
    pub output: String,
    /// Failure description.
    pub error: Option<String>,
    /// Agent-side identifier.
    pub remote_session_id: Option<String>,
    /// Stream checkpoint.
    pub last_event_id: Option<String>,
    /// Acknowledgement timestamp.
    pub started_at: Option<DateTime<Utc>>,
    /// Terminal status timestamp.
    pub completed_at: Option<DateTime<Utc>>,
    /// Run duration in milliseconds.
    pub duration_ms: Option<i64>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}
