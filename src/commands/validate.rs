// src/commands/validate.rs
//! Standalone integrity check

use super::load_cipher;
use anyhow::{Context, Result};
use provider_migrate::MigrationEngine;
use provider_migrate::db;
use std::path::Path;
use tracing::info;

/// Run the integrity validator and print its findings
pub fn cmd_validate(db_path: &str, key_file: Option<&Path>, json: bool) -> Result<()> {
    info!("Validating transfer configurations in {}", db_path);

    let conn = db::open(db_path).context("Failed to open transfer database")?;
    let engine = MigrationEngine::new(load_cipher(db_path, key_file)?);
    let report = engine.validate(&conn).context("Validation could not read storage")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("{}", "=".repeat(40));
        println!("Valid configurations:    {}", report.valid_configs);
        println!("Invalid configurations:  {}", report.invalid_configs);
        println!("Missing providers:       {}", report.missing_providers);
        if !report.errors.is_empty() {
            println!("\nFindings ({}):", report.errors.len());
            for error in &report.errors {
                println!("  - {}", error);
            }
        }
    }

    if !report.success {
        anyhow::bail!(
            "{} configuration(s) failed validation",
            report.invalid_configs
        );
    }
    Ok(())
}
