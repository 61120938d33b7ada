// src/crypto/mod.rs

//! Secret protection at rest
//!
//! The migration engine never handles key material itself. It talks to a
//! [`SecretCipher`], which the caller injects. [`AesGcmCipher`] is the
//! implementation the CLI uses: AES-256-GCM with a key derived from an
//! operator passphrase.

mod gateway;

pub use gateway::EncryptionGateway;

use crate::error::{Error, Result};
use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Prefix marking a value produced by [`AesGcmCipher`]
pub const CIPHER_PREFIX: &str = "enc:v1:";

/// Environment variable holding the encryption passphrase
pub const KEY_ENV_VAR: &str = "PROVIDER_MIGRATE_KEY";

const NONCE_LEN: usize = 12;

/// Encryption collaborator
pub trait SecretCipher: Send + Sync {
    /// Encrypt a plaintext value into storable cipher text
    fn encrypt(&self, plaintext: &str) -> Result<String>;

    /// Decrypt cipher text produced by `encrypt`
    fn decrypt(&self, ciphertext: &str) -> Result<String>;

    /// Whether `value` is cipher text this cipher produced
    fn is_encrypted(&self, value: &str) -> bool;
}

/// AES-256-GCM cipher, output format `enc:v1:<base64(nonce || ciphertext)>`
pub struct AesGcmCipher {
    cipher: Aes256Gcm,
}

impl AesGcmCipher {
    /// Derive the key from a passphrase with SHA-256
    pub fn from_passphrase(passphrase: &str) -> Result<Self> {
        let passphrase = passphrase.trim();
        if passphrase.is_empty() {
            return Err(Error::ConfigError("Encryption passphrase is empty".to_string()));
        }

        let digest = Sha256::digest(passphrase.as_bytes());
        let key = Key::<Aes256Gcm>::from_slice(&digest);
        Ok(Self {
            cipher: Aes256Gcm::new(key),
        })
    }

    /// Read the passphrase from a key file
    pub fn from_key_file(path: &Path) -> Result<Self> {
        let passphrase = std::fs::read_to_string(path)?;
        Self::from_passphrase(&passphrase)
    }

    /// Read the passphrase from `PROVIDER_MIGRATE_KEY`
    pub fn from_env() -> Result<Self> {
        let passphrase = std::env::var(KEY_ENV_VAR).map_err(|_| {
            Error::ConfigError(format!("{} is not set", KEY_ENV_VAR))
        })?;
        Self::from_passphrase(&passphrase)
    }
}

impl SecretCipher for AesGcmCipher {
    fn encrypt(&self, plaintext: &str) -> Result<String> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|_| Error::EncryptionError("AES-GCM encryption failed".to_string()))?;

        let mut payload = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        payload.extend_from_slice(&nonce);
        payload.extend_from_slice(&ciphertext);
        Ok(format!("{}{}", CIPHER_PREFIX, BASE64.encode(payload)))
    }

    fn decrypt(&self, ciphertext: &str) -> Result<String> {
        let encoded = ciphertext.strip_prefix(CIPHER_PREFIX).ok_or_else(|| {
            Error::EncryptionError("Value is not in the expected cipher format".to_string())
        })?;
        let payload = BASE64
            .decode(encoded)
            .map_err(|e| Error::EncryptionError(format!("Invalid cipher text encoding: {}", e)))?;
        if payload.len() <= NONCE_LEN {
            return Err(Error::EncryptionError("Cipher text is truncated".to_string()));
        }

        let (nonce, body) = payload.split_at(NONCE_LEN);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), body)
            .map_err(|_| Error::EncryptionError("AES-GCM decryption failed".to_string()))?;

        String::from_utf8(plaintext)
            .map_err(|_| Error::EncryptionError("Decrypted value is not UTF-8".to_string()))
    }

    fn is_encrypted(&self, value: &str) -> bool {
        value
            .strip_prefix(CIPHER_PREFIX)
            .and_then(|encoded| BASE64.decode(encoded).ok())
            .is_some_and(|payload| payload.len() > NONCE_LEN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encrypt_decrypt() {
        let cipher = AesGcmCipher::from_passphrase("correct horse").unwrap();
        let encrypted = cipher.encrypt("hunter2").unwrap();

        assert!(encrypted.starts_with(CIPHER_PREFIX));
        assert!(!encrypted.contains("hunter2"));
        assert!(cipher.is_encrypted(&encrypted));
        assert_eq!(cipher.decrypt(&encrypted).unwrap(), "hunter2");
    }

    #[test]
    fn test_nonce_makes_output_unique() {
        let cipher = AesGcmCipher::from_passphrase("correct horse").unwrap();
        assert_ne!(cipher.encrypt("same").unwrap(), cipher.encrypt("same").unwrap());
    }

    #[test]
    fn test_plaintext_is_not_encrypted() {
        let cipher = AesGcmCipher::from_passphrase("correct horse").unwrap();
        assert!(!cipher.is_encrypted("hunter2"));
        assert!(!cipher.is_encrypted("enc:v1:not base64!"));
        assert!(cipher.decrypt("hunter2").is_err());
    }

    #[test]
    fn test_wrong_key_fails_to_decrypt() {
        let a = AesGcmCipher::from_passphrase("key-a").unwrap();
        let b = AesGcmCipher::from_passphrase("key-b").unwrap();
        let encrypted = a.encrypt("secret").unwrap();
        assert!(b.decrypt(&encrypted).is_err());
    }

    #[test]
    fn test_empty_passphrase_rejected() {
        assert!(matches!(
            AesGcmCipher::from_passphrase("  \n"),
            Err(Error::ConfigError(_))
        ));
    }
}
