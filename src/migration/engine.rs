// src/migration/engine.rs

//! Migration orchestrator
//!
//! Drives one run through its phases:
//!
//! ```text
//! Extracted -> ProvidersCreated -> ReferencesUpdated -> Validated -> Done
//!                     |                   |                |
//!                     +-------------------+----------------+--> RolledBack
//! ```
//!
//! Dry-run and validation-only runs stop after extraction. Every mutating
//! phase runs in its own transaction opened here; a failure in any of them
//! (or a failed validation without `force`) restores the snapshot taken
//! before the first write.

use super::backup::{MigrationBackup, rollback};
use super::create::{apply_provider_ids, create_providers};
use super::error::{MigrationError, MigrationFailure};
use super::extract::{Extraction, extract};
use super::options::RunOptions;
use super::rewrite::rewrite_references;
use super::sanitize::Sanitizer;
use super::stats::{MigrationPhase, MigrationStats};
use super::strategy::StrategyRegistry;
use super::validate::{ValidationReport, validate};
use crate::crypto::{EncryptionGateway, SecretCipher};
use crate::db;
use crate::error::Result;
use rusqlite::Connection;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Moves inline credentials of legacy transfer configurations into shared
/// storage providers
pub struct MigrationEngine {
    gateway: EncryptionGateway,
    registry: StrategyRegistry,
}

impl MigrationEngine {
    /// Create an engine with the built-in provider strategies
    pub fn new(cipher: Arc<dyn SecretCipher>) -> Self {
        Self {
            gateway: EncryptionGateway::new(cipher),
            registry: StrategyRegistry::default(),
        }
    }

    /// Run the integrity validator against current storage
    pub fn validate(&self, conn: &Connection) -> Result<ValidationReport> {
        validate(conn, &self.gateway)
    }

    /// Run one migration
    ///
    /// On failure the returned [`MigrationFailure`] still carries every
    /// counter, warning and error gathered up to that point.
    pub fn run(
        &self,
        conn: &mut Connection,
        options: &RunOptions,
    ) -> std::result::Result<MigrationStats, MigrationFailure> {
        let sanitizer = Sanitizer::new(options.debug_mode);
        let mut stats = MigrationStats::new();
        stats.dry_run = options.dry_run;
        stats.validation_only = options.validation_only;
        info!(
            "Starting provider migration (dry_run={}, validation_only={}, force={})",
            options.dry_run, options.validation_only, options.force
        );

        let mut extraction = match extract(conn, &self.registry) {
            Ok(extraction) => extraction,
            Err(e) => {
                let error = MigrationError::Extraction(sanitizer.sanitize(&e.to_string()));
                return Err(fail(stats, error));
            }
        };
        record_extraction(&mut stats, &extraction);
        enter(&mut stats, MigrationPhase::Extracted);

        if options.validation_only {
            match validate(conn, &self.gateway) {
                Ok(report) => {
                    stats
                        .warnings
                        .extend(report.errors.iter().map(|e| format!("validation: {}", e)));
                }
                Err(e) => {
                    let error = MigrationError::Database(sanitizer.sanitize(&e.to_string()));
                    return Err(fail(stats, error));
                }
            }
            stats.finish(MigrationPhase::Done);
            return Ok(stats);
        }

        if options.dry_run {
            stats.finish(MigrationPhase::Done);
            return Ok(stats);
        }

        if extraction.is_empty() {
            info!("No inline credentials left to migrate");
            stats.finish(MigrationPhase::Done);
            return Ok(stats);
        }

        let mut backup = match self.take_backup(conn, options, &sanitizer) {
            Ok(backup) => backup,
            Err(error) => return Err(fail(stats, error)),
        };

        let created = db::transaction(conn, |tx| {
            create_providers(tx, &self.gateway, &self.registry, &extraction.descriptors, options)
                .map_err(PhaseError::Phase)
        })
        .map_err(|e| e.into_migration_error(&sanitizer));
        let creation = match created {
            Ok(creation) => creation,
            Err(error) => return Err(self.abort(conn, &backup, stats, error, &sanitizer)),
        };
        backup.record_created(creation.provider_ids.values().copied());
        apply_provider_ids(&mut extraction.descriptors, &creation.provider_ids);
        stats.providers_created = creation.provider_ids.len();
        stats.auto_filled = creation.auto_filled;
        stats.warnings.extend(creation.warnings);
        info!(
            "Created provider IDs: {:?}",
            creation.provider_ids.values().collect::<Vec<_>>()
        );
        enter(&mut stats, MigrationPhase::ProvidersCreated);

        let rewritten = db::transaction(conn, |tx| {
            rewrite_references(tx, &extraction.descriptors, options).map_err(PhaseError::Phase)
        })
        .map_err(|e| e.into_migration_error(&sanitizer));
        let rewrite = match rewritten {
            Ok(rewrite) => rewrite,
            Err(error) => return Err(self.abort(conn, &backup, stats, error, &sanitizer)),
        };
        stats.configs_updated = rewrite.configs_updated;
        stats.warnings.extend(rewrite.warnings);
        enter(&mut stats, MigrationPhase::ReferencesUpdated);

        let report = match validate(conn, &self.gateway) {
            Ok(report) => report,
            Err(e) => {
                let error = MigrationError::Database(sanitizer.sanitize(&e.to_string()));
                return Err(self.abort(conn, &backup, stats, error, &sanitizer));
            }
        };
        enter(&mut stats, MigrationPhase::Validated);

        if !report.success {
            if options.force {
                warn!(
                    "Post-migration validation found {} invalid configurations; continuing because force is set",
                    report.invalid_configs
                );
                stats
                    .warnings
                    .extend(report.errors.iter().map(|e| format!("validation: {}", e)));
            } else {
                stats.errors.extend(report.errors.iter().cloned());
                let error = MigrationError::Validation {
                    invalid_configs: report.invalid_configs,
                };
                return Err(self.abort(conn, &backup, stats, error, &sanitizer));
            }
        }

        stats.finish(MigrationPhase::Done);
        info!(
            "Provider migration finished: {} providers created, {} configurations updated",
            stats.providers_created, stats.configs_updated
        );
        Ok(stats)
    }

    fn take_backup(
        &self,
        conn: &Connection,
        options: &RunOptions,
        sanitizer: &Sanitizer,
    ) -> std::result::Result<MigrationBackup, MigrationError> {
        let backup = MigrationBackup::snapshot(conn)
            .map_err(|e| MigrationError::Backup(sanitizer.sanitize(&e.to_string())))?;

        if let Some(dir) = &options.backup_dir {
            backup
                .write_to_dir(dir)
                .map_err(|e| MigrationError::Backup(sanitizer.sanitize(&e.to_string())))?;
        }
        Ok(backup)
    }

    /// Restore the snapshot and turn `error` into the run's failure
    fn abort(
        &self,
        conn: &mut Connection,
        backup: &MigrationBackup,
        mut stats: MigrationStats,
        error: MigrationError,
        sanitizer: &Sanitizer,
    ) -> MigrationFailure {
        error!("Provider migration failed: {}", error);
        stats.errors.push(error.to_string());

        match db::transaction(conn, |tx| rollback(tx, backup)) {
            Ok(summary) => {
                stats.rolled_back = true;
                for id in summary.missing_configs {
                    stats.warnings.push(format!(
                        "Transfer configuration {} no longer exists and was not restored",
                        id
                    ));
                }
                enter(&mut stats, MigrationPhase::RolledBack);
            }
            Err(e) => {
                error!("Rollback failed: {}", e);
                stats
                    .errors
                    .push(sanitizer.sanitize(&format!("rollback failed: {}", e)));
            }
        }

        let phase = stats.phase;
        stats.finish(phase);
        MigrationFailure { stats, error }
    }
}

/// Error of a phase run under [`db::transaction`]
enum PhaseError {
    /// The phase itself failed; its message is already sanitized
    Phase(MigrationError),
    /// The transaction could not be opened or committed
    Transaction(crate::Error),
}

impl From<crate::Error> for PhaseError {
    fn from(e: crate::Error) -> Self {
        PhaseError::Transaction(e)
    }
}

impl PhaseError {
    fn into_migration_error(self, sanitizer: &Sanitizer) -> MigrationError {
        match self {
            PhaseError::Phase(error) => error,
            PhaseError::Transaction(e) => MigrationError::Database(sanitizer.sanitize(&e.to_string())),
        }
    }
}

fn record_extraction(stats: &mut MigrationStats, extraction: &Extraction) {
    stats.total_configs = extraction.total_configs;
    stats.unique_source_providers = extraction.unique_source_providers;
    stats.unique_destination_providers = extraction.unique_destination_providers;
    stats.source_by_type = extraction.source_by_type.clone();
    stats.destination_by_type = extraction.destination_by_type.clone();
    stats.warnings.extend(extraction.warnings.iter().cloned());
}

fn enter(stats: &mut MigrationStats, phase: MigrationPhase) {
    info!("Migration phase: {}", phase);
    stats.phase = phase;
}

/// Failure before anything was written
fn fail(mut stats: MigrationStats, error: MigrationError) -> MigrationFailure {
    error!("Provider migration failed: {}", error);
    stats.errors.push(error.to_string());
    let phase = stats.phase;
    stats.finish(phase);
    MigrationFailure { stats, error }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::AesGcmCipher;
    use crate::db::models::{Endpoint, ProviderType, StorageProvider, TransferConfig};
    use crate::migration::sanitize::GENERIC_MESSAGE;

    fn engine() -> MigrationEngine {
        MigrationEngine::new(Arc::new(AesGcmCipher::from_passphrase("test key").unwrap()))
    }

    fn insert_sftp(conn: &Connection, name: &str, host: &str) -> i64 {
        let mut source = Endpoint::new(ProviderType::Sftp);
        source.connection.host = Some(host.into());
        source.connection.username = Some("backup".into());
        source.connection.password = Some("hunter2".into());
        let mut config = TransferConfig::new(name.into(), 1, source, Endpoint::new(ProviderType::Local));
        config.insert(conn).unwrap()
    }

    #[test]
    fn test_run_migrates_and_validates() {
        let mut conn = db::open_in_memory().unwrap();
        insert_sftp(&conn, "a", "files.example.com");
        insert_sftp(&conn, "b", "FILES.example.com");

        let stats = engine().run(&mut conn, &RunOptions::default()).unwrap();

        assert_eq!(stats.phase, MigrationPhase::Done);
        assert_eq!(stats.total_configs, 2);
        assert_eq!(stats.unique_source_providers, 1);
        assert_eq!(stats.unique_destination_providers, 1);
        assert_eq!(stats.providers_created, 2);
        assert_eq!(stats.configs_updated, 2);
        assert!(stats.errors.is_empty());
        assert_eq!(TransferConfig::count_migrated(&conn).unwrap(), 2);
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let mut conn = db::open_in_memory().unwrap();
        insert_sftp(&conn, "a", "files.example.com");
        let options = RunOptions {
            dry_run: true,
            ..Default::default()
        };

        let stats = engine().run(&mut conn, &options).unwrap();

        assert_eq!(stats.unique_source_providers, 1);
        assert_eq!(stats.providers_created, 0);
        assert_eq!(StorageProvider::count(&conn).unwrap(), 0);
        assert_eq!(TransferConfig::count_legacy(&conn).unwrap(), 1);
    }

    #[test]
    fn test_second_run_is_noop() {
        let mut conn = db::open_in_memory().unwrap();
        insert_sftp(&conn, "a", "files.example.com");
        let engine = engine();

        engine.run(&mut conn, &RunOptions::default()).unwrap();
        let second = engine.run(&mut conn, &RunOptions::default()).unwrap();

        assert_eq!(second.providers_created, 0);
        assert_eq!(second.configs_updated, 0);
        assert_eq!(StorageProvider::count(&conn).unwrap(), 2);
    }

    #[test]
    fn test_commit_failure_honors_debug_mode() {
        let error = crate::Error::InitError("commit failed near secret_key=abc123".into());

        let quiet = PhaseError::from(crate::Error::InitError(error.to_string()))
            .into_migration_error(&Sanitizer::new(false));
        let verbose = PhaseError::from(error).into_migration_error(&Sanitizer::new(true));

        assert!(matches!(&quiet, MigrationError::Database(m) if m == GENERIC_MESSAGE));
        match verbose {
            MigrationError::Database(message) => {
                assert!(message.contains("commit failed"));
                assert!(message.contains("secret_key=[REDACTED]"));
                assert!(!message.contains("abc123"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_creation_failure_leaves_no_provider() {
        let mut conn = db::open_in_memory().unwrap();
        insert_sftp(&conn, "a", "files.example.com");
        let mut source = Endpoint::new(ProviderType::Smb);
        source.connection.share = Some("backups".into());
        let mut config = TransferConfig::new("no host".into(), 1, source, Endpoint::new(ProviderType::Local));
        config.insert(&conn).unwrap();

        let options = RunOptions {
            auto_fill: false,
            ..Default::default()
        };
        let failure = engine().run(&mut conn, &options).unwrap_err();

        assert!(matches!(failure.error, MigrationError::ProviderCreation(_)));
        assert!(failure.stats.rolled_back);
        assert_eq!(failure.stats.phase, MigrationPhase::RolledBack);
        assert_eq!(StorageProvider::count(&conn).unwrap(), 0);
        assert_eq!(TransferConfig::count_legacy(&conn).unwrap(), 2);
    }
}
