//! Diesel row models for project persistence.

use super::schema::projects;
use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// Row shape shared by reads, inserts, and full-row updates.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = projects)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub struct ProjectRow {
    /// Internal project identifier.
    pub id: uuid::Uuid,
    /// Owning user.
    pub owner_id: uuid::Uuid,
    /// Display name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Compute resource name.
    pub pod_name: String,
    /// Orchestrator namespace.
    pub pod_namespace: String,
    /// Persistent volume name.
    pub volume_name: String,
    /// Aggregate status.
    pub status: String,
    /// Last observed pod phase.
    pub pod_status: Option<String>,
    /// Last provisioning error.
    pub pod_error: Option<String>,
    /// Successful provisioning timestamp.
    pub pod_created_at: Option<DateTime<Utc>>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}
