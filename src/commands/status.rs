// src/commands/status.rs
//! Migration progress overview

use anyhow::{Context, Result};
use provider_migrate::db;
use provider_migrate::db::models::{StorageProvider, TransferConfig};
use tracing::info;

/// Show configuration and provider counts
pub fn cmd_status(db_path: &str) -> Result<()> {
    info!("Reading migration status...");

    let conn = db::open(db_path).context("Failed to open transfer database")?;

    let total = TransferConfig::count(&conn)?;
    let legacy = TransferConfig::count_legacy(&conn)?;
    let migrated = TransferConfig::count_migrated(&conn)?;
    let providers = StorageProvider::count(&conn)?;

    println!("Migration Status");
    println!("{}", "=".repeat(40));
    println!("Transfer configurations:  {}", total);
    println!("  Fully migrated:         {}", migrated);
    println!("  With inline details:    {}", legacy);
    println!("Storage providers:        {}", providers);

    if total > 0 && legacy == 0 {
        println!("\nAll configurations reference storage providers.");
    } else if legacy > 0 {
        println!("\nRun 'provider-migrate migrate --dry-run' to preview the migration.");
    }

    Ok(())
}
