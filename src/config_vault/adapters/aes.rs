//! AES-256-GCM credential cipher.
//!
//! Stored blobs are laid out as `nonce || ciphertext || tag` with a 96-bit
//! nonce drawn from the operating system RNG on every encryption.

use crate::config_vault::{
    domain::{Credential, EncryptedCredential},
    ports::{CipherError, CipherResult, CredentialCipher},
};
use aes_gcm::{
    Aes256Gcm, KeyInit, Nonce,
    aead::{Aead, AeadCore, OsRng},
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Size of the AES-256 key in bytes.
const KEY_SIZE: usize = 32;

/// Size of the GCM nonce in bytes.
const NONCE_SIZE: usize = 12;

/// Size of the GCM authentication tag.
const TAG_SIZE: usize = 16;

/// AES-256-GCM implementation of [`CredentialCipher`].
#[derive(Clone)]
pub struct AesGcmCipher {
    cipher: Aes256Gcm,
}

impl AesGcmCipher {
    /// Creates a cipher from a base64-encoded 32-byte key.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::InvalidKey`] when the key is not valid base64
    /// or does not decode to exactly 32 bytes.
    pub fn from_base64_key(encoded: &str) -> CipherResult<Self> {
        let key = STANDARD
            .decode(encoded.trim())
            .map_err(|_| CipherError::InvalidKey("key is not valid base64".to_owned()))?;
        Self::from_key_bytes(&key)
    }

    /// Creates a cipher from raw key bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::InvalidKey`] unless `key` is exactly 32 bytes.
    pub fn from_key_bytes(key: &[u8]) -> CipherResult<Self> {
        if key.len() != KEY_SIZE {
            return Err(CipherError::InvalidKey(format!(
                "key must be {KEY_SIZE} bytes, got {}",
                key.len()
            )));
        }
        let cipher = Aes256Gcm::new_from_slice(key)
            .map_err(|_| CipherError::InvalidKey("key rejected by cipher".to_owned()))?;
        Ok(Self { cipher })
    }
}

impl CredentialCipher for AesGcmCipher {
    fn encrypt(&self, credential: &Credential) -> CipherResult<EncryptedCredential> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, credential.expose().as_bytes())
            .map_err(|_| CipherError::Encryption)?;

        let mut blob = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        blob.extend_from_slice(&nonce);
        blob.extend_from_slice(&ciphertext);
        Ok(EncryptedCredential::from_bytes(blob))
    }

    fn decrypt(&self, encrypted: &EncryptedCredential) -> CipherResult<Credential> {
        let bytes = encrypted.as_bytes();
        if bytes.len() < NONCE_SIZE + TAG_SIZE {
            return Err(CipherError::Decryption("ciphertext too short".to_owned()));
        }
        let (nonce_bytes, ciphertext) = bytes
            .split_at_checked(NONCE_SIZE)
            .ok_or_else(|| CipherError::Decryption("ciphertext too short".to_owned()))?;

        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|_| CipherError::Decryption("authentication failed".to_owned()))?;
        let value = String::from_utf8(plaintext)
            .map_err(|_| CipherError::Decryption("plaintext is not UTF-8".to_owned()))?;
        Ok(Credential::new(value))
    }
}

impl std::fmt::Debug for AesGcmCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AesGcmCipher")
            .field("key", &"[REDACTED]")
            .finish()
    }
}
