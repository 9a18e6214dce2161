//! Port contracts for configuration persistence and credential encryption.

mod cipher;
mod repository;

pub use cipher::{CipherError, CipherResult, CredentialCipher};
pub use repository::{ConfigRepository, ConfigRepositoryError, ConfigRepositoryResult};
