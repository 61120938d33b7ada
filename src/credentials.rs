// src/credentials.rs

//! Effective credentials for one side of a transfer
//!
//! A side either references a storage provider (migrated) or carries its
//! connection details inline (legacy). Callers that need to connect ask this
//! module and never look at the columns directly.

use crate::crypto::EncryptionGateway;
use crate::db::models::{ConnectionFields, Direction, ProviderType, StorageProvider, TransferConfig};
use crate::error::{Error, Result};
use rusqlite::Connection;

/// Where resolved credentials came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    Provider(i64),
    Inline,
}

/// Decrypted connection details for one side
#[derive(Debug, Clone)]
pub struct Credentials {
    pub provider_type: ProviderType,
    pub connection: ConnectionFields,
    pub source: CredentialSource,
}

/// Resolve the credentials a transfer would use for `direction`
pub fn resolve(
    conn: &Connection,
    gateway: &EncryptionGateway,
    config: &TransferConfig,
    direction: Direction,
) -> Result<Credentials> {
    let endpoint = config.endpoint(direction);

    if let Some(provider_id) = endpoint.provider_id.filter(|id| *id > 0) {
        let provider = StorageProvider::find_by_id(conn, provider_id)?.ok_or_else(|| {
            Error::NotFoundError(format!("storage provider {}", provider_id))
        })?;

        return Ok(Credentials {
            provider_type: provider.provider_type.clone(),
            connection: gateway.reveal(&provider.connection)?,
            source: CredentialSource::Provider(provider_id),
        });
    }

    Ok(Credentials {
        provider_type: endpoint.provider_type.clone(),
        connection: gateway.reveal(&endpoint.connection)?,
        source: CredentialSource::Inline,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::AesGcmCipher;
    use crate::db;
    use crate::db::models::Endpoint;
    use std::sync::Arc;

    fn gateway() -> EncryptionGateway {
        EncryptionGateway::new(Arc::new(AesGcmCipher::from_passphrase("test key").unwrap()))
    }

    #[test]
    fn test_resolve_inline_credentials() {
        let conn = db::open_in_memory().unwrap();
        let mut source = Endpoint::new(ProviderType::Ftp);
        source.connection.host = Some("ftp.example.com".into());
        source.connection.password = Some("plain".into());
        let config = TransferConfig::new("c".into(), 1, source, Endpoint::new(ProviderType::Local));

        let creds = resolve(&conn, &gateway(), &config, Direction::Source).unwrap();
        assert_eq!(creds.source, CredentialSource::Inline);
        assert_eq!(creds.connection.password.as_deref(), Some("plain"));
    }

    #[test]
    fn test_resolve_provider_decrypts_secrets() {
        let conn = db::open_in_memory().unwrap();
        let gateway = gateway();

        let mut provider = StorageProvider::new("p".into(), ProviderType::Sftp, 1);
        provider.connection.host = Some("sftp.example.com".into());
        provider.connection.username = Some("u".into());
        provider.connection.password = Some("hunter2".into());
        gateway.protect(&mut provider.connection).unwrap();
        let provider_id = provider.insert(&conn).unwrap();

        let mut source = Endpoint::new(ProviderType::Sftp);
        source.provider_id = Some(provider_id);
        let config = TransferConfig::new("c".into(), 1, source, Endpoint::new(ProviderType::Local));

        let creds = resolve(&conn, &gateway, &config, Direction::Source).unwrap();
        assert_eq!(creds.source, CredentialSource::Provider(provider_id));
        assert_eq!(creds.connection.password.as_deref(), Some("hunter2"));
    }

    #[test]
    fn test_resolve_missing_provider_fails() {
        let conn = db::open_in_memory().unwrap();
        let mut source = Endpoint::new(ProviderType::Sftp);
        source.provider_id = Some(42);
        let config = TransferConfig::new("c".into(), 1, source, Endpoint::new(ProviderType::Local));

        assert!(matches!(
            resolve(&conn, &gateway(), &config, Direction::Source),
            Err(Error::NotFoundError(_))
        ));
    }
}
