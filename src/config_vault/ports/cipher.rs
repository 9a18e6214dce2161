//! Credential encryption port.

use crate::config_vault::domain::{Credential, EncryptedCredential};
use thiserror::Error;

/// Result type for cipher operations.
pub type CipherResult<T> = Result<T, CipherError>;

/// Authenticated symmetric encryption of credentials.
///
/// Every call to [`CredentialCipher::encrypt`] uses a fresh random nonce, so
/// encrypting the same plaintext twice yields different ciphertext.
pub trait CredentialCipher: Send + Sync {
    /// Encrypts a plaintext credential.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::Encryption`] when the cipher fails.
    fn encrypt(&self, credential: &Credential) -> CipherResult<EncryptedCredential>;

    /// Decrypts a stored credential.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::Decryption`] when the blob is malformed or
    /// fails authentication.
    fn decrypt(&self, encrypted: &EncryptedCredential) -> CipherResult<Credential>;
}

/// Errors returned by cipher implementations.
///
/// Messages never include key material or plaintext.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CipherError {
    /// The configured key is unusable.
    #[error("invalid encryption key: {0}")]
    InvalidKey(String),

    /// Encryption failed.
    #[error("credential encryption failed")]
    Encryption,

    /// Decryption or authentication failed.
    #[error("credential decryption failed: {0}")]
    Decryption(String),
}
