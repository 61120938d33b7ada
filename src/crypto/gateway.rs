// src/crypto/gateway.rs

//! Encryption gateway - applies a [`SecretCipher`] to connection fields

use super::SecretCipher;
use crate::db::models::{ConnectionField, ConnectionFields, SECRET_FIELDS};
use crate::error::Result;
use std::sync::Arc;

/// Thin wrapper that knows which connection fields are secret
#[derive(Clone)]
pub struct EncryptionGateway {
    cipher: Arc<dyn SecretCipher>,
}

impl EncryptionGateway {
    pub fn new(cipher: Arc<dyn SecretCipher>) -> Self {
        Self { cipher }
    }

    /// Encrypt every secret field that holds plaintext
    ///
    /// Values the cipher already recognizes are left alone. Returns the
    /// fields that were encrypted.
    pub fn protect(&self, fields: &mut ConnectionFields) -> Result<Vec<ConnectionField>> {
        let mut protected = Vec::new();
        for field in SECRET_FIELDS {
            let slot = fields.text_mut(field);
            let Some(value) = slot.as_deref().filter(|v| !v.is_empty()) else {
                continue;
            };
            if self.cipher.is_encrypted(value) {
                continue;
            }
            *slot = Some(self.cipher.encrypt(value)?);
            protected.push(field);
        }
        Ok(protected)
    }

    /// Return a copy with every encrypted secret field decrypted
    ///
    /// Plaintext values (legacy inline credentials) pass through unchanged.
    pub fn reveal(&self, fields: &ConnectionFields) -> Result<ConnectionFields> {
        let mut revealed = fields.clone();
        for (field, value) in fields.present_secrets() {
            if self.cipher.is_encrypted(value) {
                *revealed.text_mut(field) = Some(self.cipher.decrypt(value)?);
            }
        }
        Ok(revealed)
    }

    /// Secret fields that hold a value the cipher does not recognize
    pub fn plaintext_secrets(&self, fields: &ConnectionFields) -> Vec<ConnectionField> {
        fields
            .present_secrets()
            .filter(|(_, value)| !self.cipher.is_encrypted(value))
            .map(|(field, _)| field)
            .collect()
    }

    pub fn is_encrypted(&self, value: &str) -> bool {
        self.cipher.is_encrypted(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::AesGcmCipher;

    fn gateway() -> EncryptionGateway {
        EncryptionGateway::new(Arc::new(AesGcmCipher::from_passphrase("test key").unwrap()))
    }

    #[test]
    fn test_protect_encrypts_only_secrets() {
        let gateway = gateway();
        let mut fields = ConnectionFields {
            host: Some("files.example.com".into()),
            username: Some("backup".into()),
            password: Some("hunter2".into()),
            client_secret: Some("oauth-secret".into()),
            ..Default::default()
        };

        let protected = gateway.protect(&mut fields).unwrap();

        assert_eq!(
            protected,
            vec![ConnectionField::Password, ConnectionField::ClientSecret]
        );
        assert_eq!(fields.host.as_deref(), Some("files.example.com"));
        assert!(gateway.is_encrypted(fields.password.as_deref().unwrap()));
        assert!(gateway.plaintext_secrets(&fields).is_empty());
    }

    #[test]
    fn test_protect_skips_already_encrypted() {
        let gateway = gateway();
        let mut fields = ConnectionFields {
            password: Some("hunter2".into()),
            ..Default::default()
        };
        gateway.protect(&mut fields).unwrap();
        let first = fields.password.clone();

        let protected = gateway.protect(&mut fields).unwrap();
        assert!(protected.is_empty());
        assert_eq!(fields.password, first);
    }

    #[test]
    fn test_reveal_restores_plaintext() {
        let gateway = gateway();
        let mut fields = ConnectionFields {
            secret_key: Some("s3-secret".into()),
            token: Some("plain-token".into()),
            ..Default::default()
        };
        fields.secret_key = Some(
            gateway
                .cipher
                .encrypt(fields.secret_key.as_deref().unwrap())
                .unwrap(),
        );

        let revealed = gateway.reveal(&fields).unwrap();
        assert_eq!(revealed.secret_key.as_deref(), Some("s3-secret"));
        assert_eq!(revealed.token.as_deref(), Some("plain-token"));
        assert_eq!(gateway.plaintext_secrets(&fields), vec![ConnectionField::Token]);
    }
}
