//! Model selection and generation parameters.

use super::{ConfigValidationError, ParseModelProviderError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Tools an agent may be allowed to use.
pub const KNOWN_TOOLS: [&str; 4] = ["file_ops", "web_search", "code_exec", "terminal"];

const OPENAI_MODELS: [&str; 4] = ["gpt-4o", "gpt-4o-mini", "gpt-4", "gpt-3.5-turbo"];

const ANTHROPIC_MODELS: [&str; 3] = [
    "claude-3-opus-20240229",
    "claude-3-sonnet-20240229",
    "claude-3-haiku-20240307",
];

/// Model provider serving the agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelProvider {
    /// `OpenAI` hosted models.
    OpenAi,
    /// Anthropic hosted models.
    Anthropic,
    /// Any other endpoint speaking a compatible API.
    Custom,
}

impl ModelProvider {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Anthropic => "anthropic",
            Self::Custom => "custom",
        }
    }

    /// Returns whether the provider offers `model`.
    ///
    /// Custom providers accept any model name.
    #[must_use]
    pub fn supports_model(self, model: &str) -> bool {
        match self {
            Self::OpenAi => OPENAI_MODELS.contains(&model),
            Self::Anthropic => ANTHROPIC_MODELS.contains(&model),
            Self::Custom => true,
        }
    }
}

impl TryFrom<&str> for ModelProvider {
    type Error = ParseModelProviderError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "anthropic" => Ok(Self::Anthropic),
            "custom" => Ok(Self::Custom),
            _ => Err(ParseModelProviderError(value.to_owned())),
        }
    }
}

impl fmt::Display for ModelProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tunable agent settings carried by one configuration version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigSettings {
    /// Model provider.
    pub model_provider: ModelProvider,
    /// Model name within the provider.
    pub model_name: String,
    /// Optional pinned model version.
    pub model_version: Option<String>,
    /// Endpoint override; required for custom providers.
    pub api_endpoint: Option<String>,
    /// Sampling temperature.
    pub temperature: f64,
    /// Completion token limit.
    pub max_tokens: u32,
    /// Tools the agent may use.
    pub enabled_tools: Vec<String>,
    /// Free-form per-tool configuration.
    pub tools_config: Option<serde_json::Value>,
    /// System prompt prepended to every run.
    pub system_prompt: Option<String>,
    /// Upper bound on agent iterations per run.
    pub max_iterations: u32,
    /// Upper bound on run duration.
    pub timeout_seconds: u32,
}

impl ConfigSettings {
    /// Creates settings for a model with default generation parameters.
    ///
    /// # Examples
    ///
    /// ```
    /// use vibe_control::config_vault::domain::{ConfigSettings, ModelProvider};
    ///
    /// let settings = ConfigSettings::new(ModelProvider::OpenAi, "gpt-4o-mini");
    /// assert_eq!(settings.max_tokens, 4096);
    /// assert!(settings.validate().is_ok());
    /// ```
    #[must_use]
    pub fn new(model_provider: ModelProvider, model_name: impl Into<String>) -> Self {
        Self {
            model_provider,
            model_name: model_name.into(),
            model_version: None,
            api_endpoint: None,
            temperature: 0.7,
            max_tokens: 4096,
            enabled_tools: vec![
                "file_ops".to_owned(),
                "web_search".to_owned(),
                "code_exec".to_owned(),
            ],
            tools_config: None,
            system_prompt: None,
            max_iterations: 10,
            timeout_seconds: 300,
        }
    }

    /// Checks provider, model, endpoint, numeric ranges, and tools.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigValidationError`] encountered.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        self.validate_model()?;

        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigValidationError::TemperatureOutOfRange(
                self.temperature,
            ));
        }
        if !(1..=128_000).contains(&self.max_tokens) {
            return Err(ConfigValidationError::MaxTokensOutOfRange(self.max_tokens));
        }
        if !(1..=50).contains(&self.max_iterations) {
            return Err(ConfigValidationError::MaxIterationsOutOfRange(
                self.max_iterations,
            ));
        }
        if !(60..=3600).contains(&self.timeout_seconds) {
            return Err(ConfigValidationError::TimeoutOutOfRange(
                self.timeout_seconds,
            ));
        }
        if let Some(tool) = self
            .enabled_tools
            .iter()
            .find(|tool| !KNOWN_TOOLS.contains(&tool.as_str()))
        {
            return Err(ConfigValidationError::UnknownTool(tool.clone()));
        }
        Ok(())
    }

    fn validate_model(&self) -> Result<(), ConfigValidationError> {
        if self.model_name.trim().is_empty() {
            return Err(ConfigValidationError::EmptyModelName);
        }
        if !self.model_provider.supports_model(&self.model_name) {
            return Err(ConfigValidationError::UnsupportedModel {
                provider: self.model_provider,
                model: self.model_name.clone(),
            });
        }
        if self.model_provider == ModelProvider::Custom {
            let endpoint = self
                .api_endpoint
                .as_deref()
                .filter(|endpoint| !endpoint.is_empty())
                .ok_or(ConfigValidationError::MissingEndpoint)?;
            if !endpoint.starts_with("https://") {
                return Err(ConfigValidationError::InsecureEndpoint);
            }
        }
        Ok(())
    }
}
