//! Validation and parsing errors for agent configuration.

use super::ModelProvider;
use thiserror::Error;

/// Errors returned when configuration settings fail validation.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigValidationError {
    /// The model provider is not recognised.
    #[error("invalid model provider: {0}")]
    UnknownProvider(String),

    /// The model is not offered by the provider.
    #[error("invalid {provider} model: {model}")]
    UnsupportedModel {
        /// Selected provider.
        provider: ModelProvider,
        /// Rejected model name.
        model: String,
    },

    /// The model name is blank.
    #[error("model name must not be empty")]
    EmptyModelName,

    /// A custom provider was configured without an endpoint.
    #[error("api_endpoint is required for custom provider")]
    MissingEndpoint,

    /// The endpoint does not use HTTPS.
    #[error("api_endpoint must use HTTPS")]
    InsecureEndpoint,

    /// Temperature lies outside `[0, 2]`.
    #[error("temperature must be between 0 and 2, got {0}")]
    TemperatureOutOfRange(f64),

    /// `max_tokens` lies outside `[1, 128000]`.
    #[error("max_tokens must be between 1 and 128000, got {0}")]
    MaxTokensOutOfRange(u32),

    /// `max_iterations` lies outside `[1, 50]`.
    #[error("max_iterations must be between 1 and 50, got {0}")]
    MaxIterationsOutOfRange(u32),

    /// `timeout_seconds` lies outside `[60, 3600]`.
    #[error("timeout_seconds must be between 60 and 3600, got {0}")]
    TimeoutOutOfRange(u32),

    /// A tool outside the allow-list was enabled.
    #[error("invalid tool: {0}")]
    UnknownTool(String),
}

/// Error returned while parsing model providers.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown model provider: {0}")]
pub struct ParseModelProviderError(pub String);

impl From<ParseModelProviderError> for ConfigValidationError {
    fn from(err: ParseModelProviderError) -> Self {
        Self::UnknownProvider(err.0)
    }
}
