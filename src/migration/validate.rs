// src/migration/validate.rs

//! Integrity validator - check that every configuration resolves through a
//! provider that exists, has the right type, and holds encrypted secrets

use crate::credentials;
use crate::crypto::EncryptionGateway;
use crate::db::models::{Direction, StorageProvider, TransferConfig};
use crate::error::Result;
use rusqlite::Connection;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, info};

/// Findings of one validation pass
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
    pub success: bool,
    pub valid_configs: usize,
    pub invalid_configs: usize,
    pub missing_providers: usize,
    /// One entry per finding: `config <id> (<direction>): <finding>`
    pub errors: Vec<String>,
    pub config_ids_with_errors: BTreeSet<i64>,
}

impl ValidationReport {
    fn record(&mut self, config_id: i64, direction: Direction, finding: impl AsRef<str>) {
        self.errors.push(format!(
            "config {} ({}): {}",
            config_id,
            direction,
            finding.as_ref()
        ));
        self.config_ids_with_errors.insert(config_id);
    }
}

/// Re-read all configurations and providers and check their links
///
/// Read-only. Providers are loaded once up front.
pub fn validate(conn: &Connection, gateway: &EncryptionGateway) -> Result<ValidationReport> {
    let configs = TransferConfig::list_all(conn)?;
    let providers: HashMap<i64, StorageProvider> = StorageProvider::list_all(conn)?
        .into_iter()
        .filter_map(|p| p.id.map(|id| (id, p)))
        .collect();
    info!(
        "Validating {} transfer configurations against {} storage providers",
        configs.len(),
        providers.len()
    );

    let mut report = ValidationReport::default();

    for config in &configs {
        let Some(config_id) = config.id else {
            continue;
        };

        for direction in Direction::BOTH {
            check_side(conn, gateway, &providers, config, config_id, direction, &mut report);
        }

        if report.config_ids_with_errors.contains(&config_id) {
            report.invalid_configs += 1;
        } else {
            report.valid_configs += 1;
        }
    }

    report.success = report.errors.is_empty();
    debug!(
        "Validation finished: {} valid, {} invalid, {} missing providers",
        report.valid_configs, report.invalid_configs, report.missing_providers
    );
    Ok(report)
}

fn check_side(
    conn: &Connection,
    gateway: &EncryptionGateway,
    providers: &HashMap<i64, StorageProvider>,
    config: &TransferConfig,
    config_id: i64,
    direction: Direction,
    report: &mut ValidationReport,
) {
    let endpoint = config.endpoint(direction);
    let is_local = endpoint.provider_type.is_local();

    let provider_id = endpoint.provider_id.filter(|id| *id > 0);
    let provider = match provider_id {
        Some(provider_id) => match providers.get(&provider_id) {
            Some(provider) => {
                if provider.provider_type != endpoint.provider_type {
                    report.record(
                        config_id,
                        direction,
                        format!(
                            "provider {} has type {} but the configuration expects {}",
                            provider_id, provider.provider_type, endpoint.provider_type
                        ),
                    );
                }
                Some(provider)
            }
            None => {
                report.missing_providers += 1;
                report.record(
                    config_id,
                    direction,
                    format!("references provider {} which does not exist", provider_id),
                );
                None
            }
        },
        None => {
            if !is_local {
                report.record(config_id, direction, "still uses inline connection details");
            }
            None
        }
    };

    if is_local {
        return;
    }

    // A dangling reference was already reported above.
    let dangling = provider_id.is_some() && provider.is_none();
    if !dangling && let Err(e) = credentials::resolve(conn, gateway, config, direction) {
        report.record(
            config_id,
            direction,
            format!("credentials could not be resolved ({})", error_class(&e)),
        );
    }

    if let Some(provider) = provider {
        let plaintext = gateway.plaintext_secrets(&provider.connection);
        if !plaintext.is_empty() {
            let fields: Vec<&str> = plaintext.iter().map(|f| f.column()).collect();
            report.record(
                config_id,
                direction,
                format!(
                    "provider {} stores unencrypted {}",
                    provider.id.unwrap_or_default(),
                    fields.join(", ")
                ),
            );
        }
    }
}

/// Error category without the message, which may quote stored values
fn error_class(e: &crate::Error) -> &'static str {
    match e {
        crate::Error::DatabaseError(_) => "database error",
        crate::Error::EncryptionError(_) => "decryption failed",
        crate::Error::NotFoundError(_) => "provider not found",
        _ => "unexpected error",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{AesGcmCipher, SecretCipher};
    use crate::db;
    use crate::db::models::{Endpoint, ProviderType};
    use std::sync::Arc;

    fn gateway() -> EncryptionGateway {
        EncryptionGateway::new(Arc::new(AesGcmCipher::from_passphrase("test key").unwrap()))
    }

    fn insert_provider(conn: &Connection, provider_type: ProviderType, password: Option<String>) -> i64 {
        let mut provider = StorageProvider::new("p".into(), provider_type, 1);
        provider.connection.host = Some("files.example.com".into());
        provider.connection.username = Some("backup".into());
        provider.connection.password = password;
        provider.insert(conn).unwrap()
    }

    fn insert_config(conn: &Connection, source_type: ProviderType, source_provider: Option<i64>) -> i64 {
        let mut source = Endpoint::new(source_type);
        source.provider_id = source_provider;
        let mut config = TransferConfig::new("c".into(), 1, source, Endpoint::new(ProviderType::Local));
        config.insert(conn).unwrap()
    }

    #[test]
    fn test_migrated_config_is_valid() {
        let conn = db::open_in_memory().unwrap();
        let gateway = gateway();
        let secret = AesGcmCipher::from_passphrase("test key")
            .unwrap()
            .encrypt("pw")
            .unwrap();
        let provider_id = insert_provider(&conn, ProviderType::Sftp, Some(secret));
        insert_config(&conn, ProviderType::Sftp, Some(provider_id));

        let report = validate(&conn, &gateway).unwrap();
        assert!(report.success, "{:?}", report.errors);
        assert_eq!(report.valid_configs, 1);
    }

    #[test]
    fn test_inline_side_is_invalid() {
        let conn = db::open_in_memory().unwrap();
        let id = insert_config(&conn, ProviderType::Sftp, None);

        let report = validate(&conn, &gateway()).unwrap();
        assert!(!report.success);
        assert_eq!(report.invalid_configs, 1);
        assert!(report.config_ids_with_errors.contains(&id));
        assert!(report.errors[0].starts_with(&format!("config {} (source): ", id)));
    }

    #[test]
    fn test_flags_plaintext_secret() {
        let conn = db::open_in_memory().unwrap();
        let provider_id = insert_provider(&conn, ProviderType::Sftp, Some("plain".into()));
        insert_config(&conn, ProviderType::Sftp, Some(provider_id));

        let report = validate(&conn, &gateway()).unwrap();
        assert!(!report.success);
        assert!(report.errors.iter().any(|e| e.contains("unencrypted password")));
        assert!(report.errors.iter().all(|e| !e.contains("plain")));
    }

    #[test]
    fn test_flags_type_mismatch_even_for_local() {
        let conn = db::open_in_memory().unwrap();
        let provider_id = insert_provider(&conn, ProviderType::Sftp, None);
        insert_config(&conn, ProviderType::Local, Some(provider_id));

        let report = validate(&conn, &gateway()).unwrap();
        assert!(!report.success);
        assert!(report.errors.iter().any(|e| e.contains("has type sftp")));
    }

    #[test]
    fn test_flags_missing_provider() {
        let conn = db::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys = OFF").unwrap();
        insert_config(&conn, ProviderType::Sftp, Some(42));

        let report = validate(&conn, &gateway()).unwrap();
        assert_eq!(report.missing_providers, 1);
        assert_eq!(report.errors.len(), 1);
    }

    #[test]
    fn test_local_inline_sides_are_valid() {
        let conn = db::open_in_memory().unwrap();
        insert_config(&conn, ProviderType::Local, None);

        let report = validate(&conn, &gateway()).unwrap();
        assert!(report.success);
        assert_eq!(report.valid_configs, 1);
    }
}
