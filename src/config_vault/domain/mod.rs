//! Domain model for versioned agent configuration.

mod config;
mod credential;
mod error;
mod ids;
mod settings;

pub use config::{ConfigDraft, OpenCodeConfig, PersistedConfigData};
pub use credential::{Credential, EncryptedCredential};
pub use error::{ConfigValidationError, ParseModelProviderError};
pub use ids::ConfigId;
pub use settings::{ConfigSettings, KNOWN_TOOLS, ModelProvider};
