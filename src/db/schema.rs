// src/db/schema.rs

//! Database schema definitions and migrations
//!
//! This module defines the SQLite schema for transfer configurations and
//! storage providers and provides a versioned migration system to evolve
//! it over time.

use crate::error::{Error, Result};
use rusqlite::Connection;
use tracing::{debug, info};

/// Current schema version
pub const SCHEMA_VERSION: i32 = 1;

/// Initialize the schema version tracking table
fn init_schema_version(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;
    Ok(())
}

/// Get the current schema version from the database
pub fn get_schema_version(conn: &Connection) -> Result<i32> {
    init_schema_version(conn)?;

    let version: Option<i32> = conn.query_row(
        "SELECT MAX(version) FROM schema_version",
        [],
        |row| row.get(0),
    )?;

    Ok(version.unwrap_or(0))
}

/// Set the schema version
fn set_schema_version(conn: &Connection, version: i32) -> Result<()> {
    conn.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])?;
    Ok(())
}

/// Apply all pending migrations to bring the database up to date
pub fn migrate(conn: &Connection) -> Result<()> {
    let current_version = get_schema_version(conn)?;
    debug!("Current schema version: {}", current_version);

    if current_version >= SCHEMA_VERSION {
        debug!("Schema is up to date");
        return Ok(());
    }

    for version in (current_version + 1)..=SCHEMA_VERSION {
        info!("Applying schema migration to version {}", version);
        apply_migration(conn, version)?;
        set_schema_version(conn, version)?;
    }

    info!("Schema migration complete. Now at version {}", SCHEMA_VERSION);
    Ok(())
}

/// Apply a specific migration version
fn apply_migration(conn: &Connection, version: i32) -> Result<()> {
    match version {
        1 => migrate_v1(conn),
        _ => Err(Error::InitError(format!(
            "Unknown schema version: {}",
            version
        ))),
    }
}

/// Initial schema - Version 1
///
/// - storage_providers: shared, deduplicated connection records
/// - transfer_configs: scheduled transfers with inline (legacy) connection
///   columns per side plus nullable provider references
fn migrate_v1(conn: &Connection) -> Result<()> {
    debug!("Creating schema version 1");

    conn.execute_batch(
        "
        CREATE TABLE storage_providers (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            type TEXT NOT NULL,
            host TEXT,
            port INTEGER,
            username TEXT,
            password TEXT,
            key_file TEXT,
            endpoint TEXT,
            region TEXT,
            access_key TEXT,
            secret_key TEXT,
            share TEXT,
            domain TEXT,
            client_id TEXT,
            client_secret TEXT,
            drive_id TEXT,
            token TEXT,
            authenticated INTEGER NOT NULL DEFAULT 0,
            owner_id INTEGER NOT NULL,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        );

        CREATE INDEX idx_storage_providers_type ON storage_providers(type);
        CREATE INDEX idx_storage_providers_owner ON storage_providers(owner_id);

        CREATE TABLE transfer_configs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            owner_id INTEGER NOT NULL,
            schedule TEXT,
            enabled INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,

            source_type TEXT NOT NULL DEFAULT 'local',
            source_path TEXT,
            source_host TEXT,
            source_port INTEGER,
            source_username TEXT,
            source_password TEXT,
            source_key_file TEXT,
            source_endpoint TEXT,
            source_region TEXT,
            source_access_key TEXT,
            source_secret_key TEXT,
            source_share TEXT,
            source_domain TEXT,
            source_client_id TEXT,
            source_client_secret TEXT,
            source_drive_id TEXT,
            source_token TEXT,
            source_authenticated INTEGER NOT NULL DEFAULT 0,
            source_provider_id INTEGER,

            dest_type TEXT NOT NULL DEFAULT 'local',
            dest_path TEXT,
            dest_host TEXT,
            dest_port INTEGER,
            dest_username TEXT,
            dest_password TEXT,
            dest_key_file TEXT,
            dest_endpoint TEXT,
            dest_region TEXT,
            dest_access_key TEXT,
            dest_secret_key TEXT,
            dest_share TEXT,
            dest_domain TEXT,
            dest_client_id TEXT,
            dest_client_secret TEXT,
            dest_drive_id TEXT,
            dest_token TEXT,
            dest_authenticated INTEGER NOT NULL DEFAULT 0,
            dest_provider_id INTEGER,

            FOREIGN KEY (source_provider_id) REFERENCES storage_providers(id) ON DELETE SET NULL,
            FOREIGN KEY (dest_provider_id) REFERENCES storage_providers(id) ON DELETE SET NULL
        );

        CREATE INDEX idx_transfer_configs_owner ON transfer_configs(owner_id);
        CREATE INDEX idx_transfer_configs_source_provider ON transfer_configs(source_provider_id);
        CREATE INDEX idx_transfer_configs_dest_provider ON transfer_configs(dest_provider_id);
        ",
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn create_test_db() -> (NamedTempFile, Connection) {
        let temp_file = NamedTempFile::new().unwrap();
        let conn = Connection::open(temp_file.path()).unwrap();
        conn.execute("PRAGMA foreign_keys = ON", []).unwrap();
        (temp_file, conn)
    }

    #[test]
    fn test_schema_version_tracking() {
        let (_temp, conn) = create_test_db();

        assert_eq!(get_schema_version(&conn).unwrap(), 0);
        migrate(&conn).unwrap();
        assert_eq!(get_schema_version(&conn).unwrap(), SCHEMA_VERSION);
    }

    #[test]
    fn test_migrate_creates_all_tables() {
        let (_temp, conn) = create_test_db();
        migrate(&conn).unwrap();

        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<_, _>>()
            .unwrap();

        assert!(tables.contains(&"storage_providers".to_string()));
        assert!(tables.contains(&"transfer_configs".to_string()));
        assert!(tables.contains(&"schema_version".to_string()));
    }

    #[test]
    fn test_migrate_is_idempotent() {
        let (_temp, conn) = create_test_db();

        migrate(&conn).unwrap();
        migrate(&conn).unwrap();

        assert_eq!(get_schema_version(&conn).unwrap(), SCHEMA_VERSION);
    }

    #[test]
    fn test_provider_delete_clears_references() {
        let (_temp, conn) = create_test_db();
        migrate(&conn).unwrap();

        conn.execute(
            "INSERT INTO storage_providers (name, type, owner_id) VALUES ('p', 'sftp', 1)",
            [],
        )
        .unwrap();
        let provider_id = conn.last_insert_rowid();
        conn.execute(
            "INSERT INTO transfer_configs (name, owner_id, source_type, source_provider_id)
             VALUES ('c', 1, 'sftp', ?1)",
            [provider_id],
        )
        .unwrap();

        conn.execute("DELETE FROM storage_providers WHERE id = ?1", [provider_id])
            .unwrap();

        let reference: Option<i64> = conn
            .query_row("SELECT source_provider_id FROM transfer_configs", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(reference, None);
    }
}
