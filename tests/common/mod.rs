// tests/common/mod.rs

//! Shared test utilities and helpers for integration tests.

#![allow(dead_code)]

use provider_migrate::crypto::{AesGcmCipher, SecretCipher};
use provider_migrate::db;
use provider_migrate::db::models::{Endpoint, ProviderType, TransferConfig};
use provider_migrate::{MigrationEngine, Result};
use rusqlite::Connection;
use std::sync::Arc;
use tempfile::TempDir;

pub const TEST_PASSPHRASE: &str = "integration test passphrase";

/// Create an empty database on disk.
///
/// Returns (TempDir, db_path) - keep the TempDir alive to prevent cleanup.
pub fn setup_test_db() -> (TempDir, String) {
    let temp_dir = tempfile::tempdir().unwrap();
    let db_path = temp_dir
        .path()
        .join("transfers.db")
        .to_str()
        .unwrap()
        .to_string();

    db::init(&db_path).unwrap();
    (temp_dir, db_path)
}

pub fn test_cipher() -> AesGcmCipher {
    AesGcmCipher::from_passphrase(TEST_PASSPHRASE).unwrap()
}

pub fn test_engine() -> MigrationEngine {
    MigrationEngine::new(Arc::new(test_cipher()))
}

/// Encrypts normally but never recognizes its own output, so every stored
/// secret looks like plaintext to the validator
pub struct BlindCipher(pub AesGcmCipher);

impl SecretCipher for BlindCipher {
    fn encrypt(&self, plaintext: &str) -> Result<String> {
        self.0.encrypt(plaintext)
    }

    fn decrypt(&self, ciphertext: &str) -> Result<String> {
        self.0.decrypt(ciphertext)
    }

    fn is_encrypted(&self, _value: &str) -> bool {
        false
    }
}

pub fn blind_engine() -> MigrationEngine {
    MigrationEngine::new(Arc::new(BlindCipher(test_cipher())))
}

pub fn sftp(host: &str, username: &str, password: &str) -> Endpoint {
    let mut endpoint = Endpoint::new(ProviderType::Sftp);
    endpoint.path = Some("/incoming".to_string());
    endpoint.connection.host = Some(host.to_string());
    endpoint.connection.username = Some(username.to_string());
    endpoint.connection.password = Some(password.to_string());
    endpoint
}

pub fn s3(endpoint_url: &str, region: &str, access_key: &str, secret_key: &str) -> Endpoint {
    let mut endpoint = Endpoint::new(ProviderType::S3);
    endpoint.path = Some("bucket/prefix".to_string());
    endpoint.connection.endpoint = Some(endpoint_url.to_string());
    endpoint.connection.region = Some(region.to_string());
    endpoint.connection.access_key = Some(access_key.to_string());
    endpoint.connection.secret_key = Some(secret_key.to_string());
    endpoint
}

pub fn smb(host: Option<&str>, share: &str, username: &str, password: &str) -> Endpoint {
    let mut endpoint = Endpoint::new(ProviderType::Smb);
    endpoint.connection.host = host.map(String::from);
    endpoint.connection.share = Some(share.to_string());
    endpoint.connection.username = Some(username.to_string());
    endpoint.connection.password = Some(password.to_string());
    endpoint
}

pub fn onedrive(client_id: &str, drive_id: &str, token: &str) -> Endpoint {
    let mut endpoint = Endpoint::new(ProviderType::OneDrive);
    endpoint.connection.client_id = Some(client_id.to_string());
    endpoint.connection.drive_id = Some(drive_id.to_string());
    endpoint.connection.token = Some(token.to_string());
    endpoint.connection.authenticated = true;
    endpoint
}

pub fn local(path: &str) -> Endpoint {
    let mut endpoint = Endpoint::new(ProviderType::Local);
    endpoint.path = Some(path.to_string());
    endpoint
}

/// Insert a configuration owned by `owner_id`
pub fn insert_config(
    conn: &Connection,
    name: &str,
    owner_id: i64,
    source: Endpoint,
    destination: Endpoint,
) -> i64 {
    let mut config = TransferConfig::new(name.to_string(), owner_id, source, destination);
    config.schedule = Some("0 2 * * *".to_string());
    config.insert(conn).unwrap()
}
