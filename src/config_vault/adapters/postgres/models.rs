//! Diesel row models for configuration persistence.

use super::schema::opencode_configs;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;

/// Row shape for reads and inserts of configuration versions.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = opencode_configs)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ConfigRow {
    /// Internal version identifier.
    pub id: uuid::Uuid,
    /// Owning project.
    pub project_id: uuid::Uuid,
    /// Version number.
    pub version: i32,
    /// Active flag.
    pub is_active: bool,
    /// Model provider.
    pub model_provider: String,
    /// Model name.
    pub model_name: String,
    /// Pinned model version.
    pub model_version: Option<String>,
    /// Endpoint override.
    pub api_endpoint: Option<String>,
    /// Encrypted credential blob.
    pub api_key_encrypted: Option<Vec<u8>>,
    /// Sampling temperature.
    pub temperature: f64,
    /// Completion token limit.
    pub max_tokens: i32,
    /// Enabled tools.
    pub enabled_tools: Value,
    /// Per-tool configuration.
    pub tools_config: Option<Value>,
    /// System prompt.
    pub system_prompt: Option<String>,
    /// Iteration limit.
    pub max_iterations: i32,
    /// Run timeout in seconds.
    pub timeout_seconds: i32,
    /// Author.
    pub created_by: uuid::Uuid,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}
