//! `PostgreSQL` repository implementation for the configuration log.

use super::{models::ConfigRow, schema::opencode_configs};
use crate::config_vault::{
    domain::{
        ConfigDraft, ConfigId, ConfigSettings, EncryptedCredential, ModelProvider, OpenCodeConfig,
        PersistedConfigData,
    },
    ports::{ConfigRepository, ConfigRepositoryError, ConfigRepositoryResult},
};
use crate::postgres::{BackendFailure, PgPool, run_blocking};
use crate::workspace::domain::{ProjectId, UserId};
use async_trait::async_trait;
use diesel::dsl::max;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};

/// `PostgreSQL`-backed configuration repository.
#[derive(Debug, Clone)]
pub struct PostgresConfigRepository {
    pool: PgPool,
}

impl PostgresConfigRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl BackendFailure for ConfigRepositoryError {
    fn backend(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::persistence(err)
    }
}

#[async_trait]
impl ConfigRepository for PostgresConfigRepository {
    async fn create_version(&self, draft: &ConfigDraft) -> ConfigRepositoryResult<OpenCodeConfig> {
        let owned_draft = draft.clone();
        run_blocking(&self.pool, move |connection| {
            let project_id = owned_draft.project_id();
            connection
                .transaction::<_, DieselError, _>(|tx| {
                    // Serialises writers per project; the partial unique
                    // index still guards the single-active invariant.
                    diesel::sql_query("SELECT id FROM projects WHERE id = $1 FOR UPDATE")
                        .bind::<diesel::sql_types::Uuid, _>(project_id.into_inner())
                        .execute(tx)?;

                    let latest = opencode_configs::table
                        .filter(opencode_configs::project_id.eq(project_id.into_inner()))
                        .select(max(opencode_configs::version))
                        .first::<Option<i32>>(tx)?;
                    let next_version = latest.map_or(1, |current| current.saturating_add(1));

                    diesel::update(
                        opencode_configs::table
                            .filter(opencode_configs::project_id.eq(project_id.into_inner()))
                            .filter(opencode_configs::is_active.eq(true)),
                    )
                    .set(opencode_configs::is_active.eq(false))
                    .execute(tx)?;

                    let row = to_row(&owned_draft, next_version);
                    diesel::insert_into(opencode_configs::table)
                        .values(&row)
                        .execute(tx)?;
                    Ok(row)
                })
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        ConfigRepositoryError::VersionConflict(project_id)
                    }
                    _ => ConfigRepositoryError::persistence(err),
                })
                .and_then(row_to_config)
        })
        .await
    }

    async fn find_active(
        &self,
        project_id: ProjectId,
    ) -> ConfigRepositoryResult<Option<OpenCodeConfig>> {
        run_blocking(&self.pool, move |connection| {
            let row = opencode_configs::table
                .filter(opencode_configs::project_id.eq(project_id.into_inner()))
                .filter(opencode_configs::is_active.eq(true))
                .select(ConfigRow::as_select())
                .first::<ConfigRow>(connection)
                .optional()
                .map_err(ConfigRepositoryError::persistence)?;
            row.map(row_to_config).transpose()
        })
        .await
    }

    async fn find_version(
        &self,
        project_id: ProjectId,
        version: u32,
    ) -> ConfigRepositoryResult<Option<OpenCodeConfig>> {
        let Ok(stored_version) = i32::try_from(version) else {
            return Ok(None);
        };
        run_blocking(&self.pool, move |connection| {
            let row = opencode_configs::table
                .filter(opencode_configs::project_id.eq(project_id.into_inner()))
                .filter(opencode_configs::version.eq(stored_version))
                .select(ConfigRow::as_select())
                .first::<ConfigRow>(connection)
                .optional()
                .map_err(ConfigRepositoryError::persistence)?;
            row.map(row_to_config).transpose()
        })
        .await
    }

    async fn history(&self, project_id: ProjectId) -> ConfigRepositoryResult<Vec<OpenCodeConfig>> {
        run_blocking(&self.pool, move |connection| {
            let rows = opencode_configs::table
                .filter(opencode_configs::project_id.eq(project_id.into_inner()))
                .order(opencode_configs::version.desc())
                .select(ConfigRow::as_select())
                .load::<ConfigRow>(connection)
                .map_err(ConfigRepositoryError::persistence)?;
            rows.into_iter().map(row_to_config).collect()
        })
        .await
    }

    async fn delete_version(
        &self,
        project_id: ProjectId,
        version: u32,
    ) -> ConfigRepositoryResult<()> {
        let not_found = ConfigRepositoryError::VersionNotFound {
            project_id,
            version,
        };
        let Ok(stored_version) = i32::try_from(version) else {
            return Err(not_found);
        };
        run_blocking(&self.pool, move |connection| {
            let target = opencode_configs::table
                .filter(opencode_configs::project_id.eq(project_id.into_inner()))
                .filter(opencode_configs::version.eq(stored_version));

            let is_active = target
                .clone()
                .select(opencode_configs::is_active)
                .first::<bool>(connection)
                .optional()
                .map_err(ConfigRepositoryError::persistence)?
                .ok_or(not_found)?;
            if is_active {
                return Err(ConfigRepositoryError::ActiveVersion {
                    project_id,
                    version,
                });
            }

            diesel::delete(target.filter(opencode_configs::is_active.eq(false)))
                .execute(connection)
                .map_err(ConfigRepositoryError::persistence)?;
            Ok(())
        })
        .await
    }
}

fn to_row(draft: &ConfigDraft, version: i32) -> ConfigRow {
    let settings = draft.settings();
    ConfigRow {
        id: draft.id().into_inner(),
        project_id: draft.project_id().into_inner(),
        version,
        is_active: true,
        model_provider: settings.model_provider.as_str().to_owned(),
        model_name: settings.model_name.clone(),
        model_version: settings.model_version.clone(),
        api_endpoint: settings.api_endpoint.clone(),
        api_key_encrypted: draft
            .encrypted_credential()
            .map(|blob| blob.as_bytes().to_vec()),
        temperature: settings.temperature,
        max_tokens: to_column(settings.max_tokens),
        enabled_tools: serde_json::Value::from(settings.enabled_tools.clone()),
        tools_config: settings.tools_config.clone(),
        system_prompt: settings.system_prompt.clone(),
        max_iterations: to_column(settings.max_iterations),
        timeout_seconds: to_column(settings.timeout_seconds),
        created_by: draft.created_by().into_inner(),
        created_at: draft.created_at(),
    }
}

/// Validated settings are far below `i32::MAX`; saturate rather than wrap.
fn to_column(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

fn from_column(value: i32) -> ConfigRepositoryResult<u32> {
    u32::try_from(value).map_err(ConfigRepositoryError::persistence)
}

fn row_to_config(row: ConfigRow) -> ConfigRepositoryResult<OpenCodeConfig> {
    let model_provider = ModelProvider::try_from(row.model_provider.as_str())
        .map_err(ConfigRepositoryError::persistence)?;
    let enabled_tools = serde_json::from_value::<Vec<String>>(row.enabled_tools)
        .map_err(ConfigRepositoryError::persistence)?;

    let settings = ConfigSettings {
        model_provider,
        model_name: row.model_name,
        model_version: row.model_version,
        api_endpoint: row.api_endpoint,
        temperature: row.temperature,
        max_tokens: from_column(row.max_tokens)?,
        enabled_tools,
        tools_config: row.tools_config,
        system_prompt: row.system_prompt,
        max_iterations: from_column(row.max_iterations)?,
        timeout_seconds: from_column(row.timeout_seconds)?,
    };

    Ok(OpenCodeConfig::from_persisted(PersistedConfigData {
        id: ConfigId::from_uuid(row.id),
        project_id: ProjectId::from_uuid(row.project_id),
        version: from_column(row.version)?,
        is_active: row.is_active,
        settings,
        encrypted_credential: row
            .api_key_encrypted
            .filter(|blob| !blob.is_empty())
            .map(EncryptedCredential::from_bytes),
        created_by: UserId::from_uuid(row.created_by),
        created_at: row.created_at,
    }))
}
