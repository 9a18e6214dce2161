//! Agent configuration endpoints.
//!
//! Every response is a sanitised configuration; the stored credential is
//! write-only through this surface.

use crate::config_vault::domain::{
    ConfigSettings, ConfigValidationError, Credential, ModelProvider, OpenCodeConfig,
};
use crate::http::auth::Caller;
use crate::http::error::{ApiError, ApiResult};
use crate::http::extract::{JsonBody, PathParams};
use crate::http::state::AppState;
use crate::workspace::domain::{ProjectId, UserId};
use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::Deserialize;
use serde_json::Value;

/// Create/update payload; omitted settings take their defaults.
#[derive(Debug, Deserialize)]
pub(crate) struct ConfigBody {
    model_provider: String,
    model_name: String,
    #[serde(default)]
    model_version: Option<String>,
    #[serde(default)]
    api_endpoint: Option<String>,
    #[serde(default)]
    api_key: Option<String>,
    #[serde(default)]
    temperature: Option<f64>,
    #[serde(default)]
    max_tokens: Option<u32>,
    #[serde(default)]
    enabled_tools: Option<Vec<String>>,
    #[serde(default)]
    tools_config: Option<Value>,
    #[serde(default)]
    system_prompt: Option<String>,
    #[serde(default)]
    max_iterations: Option<u32>,
    #[serde(default)]
    timeout_seconds: Option<u32>,
}

impl ConfigBody {
    fn into_parts(self) -> Result<(ConfigSettings, Option<Credential>), ConfigValidationError> {
        let provider = ModelProvider::try_from(self.model_provider.as_str())?;
        let mut settings = ConfigSettings::new(provider, self.model_name);
        settings.model_version = self.model_version;
        settings.api_endpoint = self.api_endpoint;
        settings.tools_config = self.tools_config;
        settings.system_prompt = self.system_prompt;
        if let Some(temperature) = self.temperature {
            settings.temperature = temperature;
        }
        if let Some(max_tokens) = self.max_tokens {
            settings.max_tokens = max_tokens;
        }
        if let Some(tools) = self.enabled_tools {
            settings.enabled_tools = tools;
        }
        if let Some(max_iterations) = self.max_iterations {
            settings.max_iterations = max_iterations;
        }
        if let Some(timeout) = self.timeout_seconds {
            settings.timeout_seconds = timeout;
        }
        Ok((settings, self.api_key.map(Credential::new)))
    }
}

async fn owned(state: &AppState, project_id: ProjectId, user_id: UserId) -> ApiResult<()> {
    state.projects.get_project(project_id, user_id).await?;
    Ok(())
}

pub(crate) async fn active(
    State(state): State<AppState>,
    Caller(user_id): Caller,
    PathParams(project_id): PathParams<ProjectId>,
) -> ApiResult<Json<OpenCodeConfig>> {
    owned(&state, project_id, user_id).await?;
    Ok(Json(state.vault.active_config(project_id).await?))
}

/// `POST /api/projects/{id}/config`: appends a new active version.
pub(crate) async fn create_or_update(
    State(state): State<AppState>,
    Caller(user_id): Caller,
    PathParams(project_id): PathParams<ProjectId>,
    JsonBody(body): JsonBody<ConfigBody>,
) -> ApiResult<(StatusCode, Json<OpenCodeConfig>)> {
    owned(&state, project_id, user_id).await?;
    let (settings, credential) = body
        .into_parts()
        .map_err(|err| ApiError::bad_request(err.to_string()))?;
    let config = state
        .vault
        .create_or_update(project_id, user_id, settings, credential)
        .await?;
    Ok((StatusCode::CREATED, Json(config)))
}

pub(crate) async fn versions(
    State(state): State<AppState>,
    Caller(user_id): Caller,
    PathParams(project_id): PathParams<ProjectId>,
) -> ApiResult<Json<Vec<OpenCodeConfig>>> {
    owned(&state, project_id, user_id).await?;
    Ok(Json(state.vault.history(project_id).await?))
}

/// `POST .../config/rollback/{version}`: copies `version` into a new
/// active version.
pub(crate) async fn rollback(
    State(state): State<AppState>,
    Caller(user_id): Caller,
    PathParams((project_id, version)): PathParams<(ProjectId, u32)>,
) -> ApiResult<(StatusCode, Json<OpenCodeConfig>)> {
    owned(&state, project_id, user_id).await?;
    let config = state.vault.rollback(project_id, version, user_id).await?;
    Ok((StatusCode::CREATED, Json(config)))
}

pub(crate) async fn delete_version(
    State(state): State<AppState>,
    Caller(user_id): Caller,
    PathParams((project_id, version)): PathParams<(ProjectId, u32)>,
) -> ApiResult<StatusCode> {
    owned(&state, project_id, user_id).await?;
    state.vault.delete_version(project_id, version).await?;
    Ok(StatusCode::NO_CONTENT)
}
