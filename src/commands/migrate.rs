// src/commands/migrate.rs
//! Credential migration command

use super::load_cipher;
use anyhow::{Context, Result};
use provider_migrate::db;
use provider_migrate::{MigrationEngine, MigrationStats, RunOptions, format_report};
use std::path::{Path, PathBuf};
use tracing::info;

/// Command-line flags that override the options file
#[derive(Debug, Default)]
pub struct MigrateFlags {
    pub dry_run: bool,
    pub validation_only: bool,
    pub force: bool,
    pub backup_dir: Option<PathBuf>,
    pub debug: bool,
    pub no_auto_fill: bool,
}

impl MigrateFlags {
    /// Flags only ever switch behavior on (or auto-fill off)
    fn apply(self, options: &mut RunOptions) {
        options.dry_run |= self.dry_run;
        options.validation_only |= self.validation_only;
        options.force |= self.force;
        options.debug_mode |= self.debug;
        if self.no_auto_fill {
            options.auto_fill = false;
        }
        if self.backup_dir.is_some() {
            options.backup_dir = self.backup_dir;
        }
    }
}

/// Run the migration engine and print its report
pub fn cmd_migrate(
    db_path: &str,
    key_file: Option<&Path>,
    options_file: Option<&Path>,
    flags: MigrateFlags,
    json: bool,
) -> Result<()> {
    let mut options = match options_file {
        Some(path) => RunOptions::from_toml_file(path)
            .with_context(|| format!("Failed to load run options from {}", path.display()))?,
        None => RunOptions::default(),
    };
    flags.apply(&mut options);

    info!("Migrating inline credentials in {}", db_path);
    let mut conn = db::open(db_path).context("Failed to open transfer database")?;
    let cipher = load_cipher(db_path, key_file)?;
    let engine = MigrationEngine::new(cipher);

    match engine.run(&mut conn, &options) {
        Ok(stats) => {
            print_stats(&stats, json)?;
            Ok(())
        }
        Err(failure) => {
            print_stats(&failure.stats, json)?;
            Err(anyhow::Error::new(failure).context("Provider migration failed"))
        }
    }
}

fn print_stats(stats: &MigrationStats, json: bool) -> Result<()> {
    if json {
        let out = serde_json::to_string_pretty(stats).context("Failed to encode statistics")?;
        println!("{}", out);
    } else {
        print!("{}", format_report(stats));
    }
    Ok(())
}
