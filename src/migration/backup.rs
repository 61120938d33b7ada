// src/migration/backup.rs

//! Pre-migration snapshot and rollback
//!
//! The snapshot is taken before the first mutation and kept in memory for
//! the lifetime of one run. Rollback deletes the providers this run created
//! and writes every snapshotted configuration row back:
//!
//! - Providers first, so no restored row can point at a deleted provider
//! - Rows that vanished since the snapshot are reported, not recreated

use crate::db::models::{StorageProvider, TransferConfig};
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Copy of all configuration rows plus the providers created since
#[derive(Debug, Clone, Serialize)]
pub struct MigrationBackup {
    pub taken_at: DateTime<Utc>,
    pub configs: Vec<TransferConfig>,
    pub created_provider_ids: Vec<i64>,
}

/// Outcome of a rollback
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RollbackSummary {
    pub providers_deleted: usize,
    pub configs_restored: usize,
    pub missing_configs: Vec<i64>,
}

impl MigrationBackup {
    /// Copy every configuration row
    pub fn snapshot(conn: &Connection) -> Result<Self> {
        let configs = TransferConfig::list_all(conn)?;
        info!("Snapshotted {} transfer configurations", configs.len());
        Ok(Self {
            taken_at: Utc::now(),
            configs,
            created_provider_ids: Vec::new(),
        })
    }

    /// Remember providers created by this run
    pub fn record_created<I: IntoIterator<Item = i64>>(&mut self, ids: I) {
        self.created_provider_ids.extend(ids);
    }

    /// Write the snapshot as pretty JSON into `dir`
    ///
    /// The file may contain legacy inline secrets, so it is created with
    /// mode 0600 and never overwrites an existing file.
    pub fn write_to_dir(&self, dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(dir)?;
        let path = dir.join(format!(
            "provider-migration-{}.json",
            self.taken_at.format("%Y%m%dT%H%M%S%.3fZ")
        ));

        let mut options = fs::OpenOptions::new();
        options.write(true).create_new(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let mut file = options.open(&path)?;
        let json = serde_json::to_vec_pretty(self)?;
        file.write_all(&json)?;
        file.sync_all()?;

        info!("Wrote migration backup to {}", path.display());
        Ok(path)
    }
}

/// Undo a run: delete its providers and restore every snapshotted row
///
/// Runs inside the orchestrator's rollback transaction.
pub fn rollback(tx: &Connection, backup: &MigrationBackup) -> Result<RollbackSummary> {
    info!(
        "Rolling back {} created providers and {} configurations",
        backup.created_provider_ids.len(),
        backup.configs.len()
    );
    let mut summary = RollbackSummary::default();

    for provider_id in &backup.created_provider_ids {
        StorageProvider::delete(tx, *provider_id)?;
        summary.providers_deleted += 1;
    }

    for config in &backup.configs {
        match config.save(tx) {
            Ok(()) => summary.configs_restored += 1,
            Err(Error::NotFoundError(_)) => {
                let id = config.id.unwrap_or_default();
                warn!("Transfer configuration {} no longer exists; not restored", id);
                summary.missing_configs.push(id);
            }
            Err(e) => return Err(e),
        }
    }

    debug!(
        "Rollback deleted {} providers, restored {} configurations",
        summary.providers_deleted, summary.configs_restored
    );
    Ok(summary)
}
