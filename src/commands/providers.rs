// src/commands/providers.rs
//! Storage provider listing

use anyhow::{Context, Result};
use provider_migrate::db;
use provider_migrate::db::models::{ConnectionField, StorageProvider};
use tracing::info;

/// List storage providers; secret columns are never printed
pub fn cmd_providers(db_path: &str) -> Result<()> {
    info!("Listing storage providers...");

    let conn = db::open(db_path).context("Failed to open transfer database")?;
    let providers = StorageProvider::list_all(&conn)?;

    if providers.is_empty() {
        println!("No storage providers.");
        println!("\nRun 'provider-migrate migrate' to create them from transfer configurations.");
        return Ok(());
    }

    println!("{:>5}  {:10}  {:>6}  {:>5}  NAME", "ID", "TYPE", "OWNER", "REFS");
    println!("{}", "-".repeat(70));

    for provider in &providers {
        let id = provider.id.unwrap_or_default();
        let refs = StorageProvider::reference_count(&conn, id)?;
        println!(
            "{:>5}  {:10}  {:>6}  {:>5}  {}",
            id,
            provider.provider_type.as_str(),
            provider.owner_id,
            refs,
            provider.name
        );

        let stored: Vec<&str> = ConnectionField::ALL
            .iter()
            .filter(|f| f.is_secret() && provider.connection.text(**f).is_some())
            .map(|f| f.column())
            .collect();
        if !stored.is_empty() {
            println!("{:>27}secrets stored: {}", "", stored.join(", "));
        }
    }

    println!();
    println!("Total: {} provider(s)", providers.len());
    Ok(())
}
