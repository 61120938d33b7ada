// src/commands/init.rs
//! Database initialization

use anyhow::{Context, Result};
use provider_migrate::db;
use tracing::info;

/// Create the database or bring its schema up to date
pub fn cmd_init(db_path: &str) -> Result<()> {
    info!("Initializing transfer database at: {}", db_path);
    db::init(db_path).context("Failed to initialize database")?;

    let conn = db::open(db_path).context("Failed to open transfer database")?;
    let version = db::schema::get_schema_version(&conn)?;
    println!("Database initialized at: {} (schema version {})", db_path, version);
    Ok(())
}
