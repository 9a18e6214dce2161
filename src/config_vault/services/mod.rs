//! Application services for the configuration vault.

mod credentials;
mod vault;

pub use credentials::{AgentSettings, CredentialProvider};
pub use vault::{ConfigVaultError, ConfigVaultResult, ConfigVaultService};
