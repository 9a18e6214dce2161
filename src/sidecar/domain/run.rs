//! Agent run request and acknowledgement.

use crate::config_vault::services::AgentSettings;
use crate::session::domain::SessionId;
use serde::{Deserialize, Serialize};

/// Model selection and tuning sent with a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelConfig {
    /// Model provider.
    pub provider: String,
    /// Model name.
    pub model: String,
    /// Decrypted provider credential, omitted when none is configured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Sampling temperature.
    pub temperature: f64,
    /// Token budget.
    pub max_tokens: u32,
    /// Tool allow-list.
    pub enabled_tools: Vec<String>,
    /// Optional model version.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_version: Option<String>,
    /// Optional custom endpoint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_endpoint: Option<String>,
}

/// Body of the run request sent to the in-pod agent.
///
/// Carries the decrypted credential, so its `Debug` output is redacted and
/// it must never be logged or returned to API callers.
#[derive(Clone, PartialEq, Serialize)]
pub struct RunRequest {
    /// Control-plane session identifier.
    pub session_id: SessionId,
    /// Rendered task prompt.
    pub prompt: String,
    /// Model configuration.
    pub model_config: ModelConfig,
    /// Optional system prompt.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
}

impl RunRequest {
    /// Builds a run request from the project's active agent settings.
    #[must_use]
    pub fn new(session_id: SessionId, prompt: String, agent: AgentSettings) -> Self {
        let AgentSettings { config, credential } = agent;
        let settings = config.settings();
        Self {
            session_id,
            prompt,
            model_config: ModelConfig {
                provider: settings.model_provider.as_str().to_owned(),
                model: settings.model_name.clone(),
                api_key: credential.map(|secret| secret.expose().to_owned()),
                temperature: settings.temperature,
                max_tokens: settings.max_tokens,
                enabled_tools: settings.enabled_tools.clone(),
                model_version: settings.model_version.clone(),
                api_endpoint: settings.api_endpoint.clone(),
            },
            system_prompt: settings.system_prompt.clone(),
        }
    }
}

impl std::fmt::Debug for RunRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunRequest")
            .field("session_id", &self.session_id)
            .field("provider", &self.model_config.provider)
            .field("model", &self.model_config.model)
            .field("api_key", &"<redacted>")
            .finish_non_exhaustive()
    }
}

/// Acknowledgement returned by the in-pod agent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RunAcknowledgement {
    /// Identifier assigned by the agent.
    #[serde(default)]
    pub remote_session_id: Option<String>,
}
