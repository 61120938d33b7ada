// src/db/mod.rs

//! Database layer
//!
//! All transfer configurations and storage providers live in a single
//! SQLite database. This module opens connections, applies the schema and
//! provides the transaction helper every mutating phase runs under.

pub mod models;
pub mod paths;
pub mod schema;

use crate::error::{Error, Result};
use rusqlite::{Connection, Transaction};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Create the database file (and its parent directory) and apply the schema
pub fn init(db_path: &str) -> Result<()> {
    info!("Initializing database at {}", db_path);

    if let Some(parent) = Path::new(db_path).parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|e| {
            Error::InitError(format!(
                "Failed to create database directory {}: {}",
                parent.display(),
                e
            ))
        })?;
    }

    let conn = open(db_path)?;
    schema::migrate(&conn)?;
    Ok(())
}

/// Open an existing database with foreign keys enforced
pub fn open(db_path: &str) -> Result<Connection> {
    debug!("Opening database {}", db_path);
    let conn = Connection::open(db_path)?;
    configure(&conn)?;
    Ok(conn)
}

/// Open a private in-memory database with the schema applied
pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    configure(&conn)?;
    schema::migrate(&conn)?;
    Ok(conn)
}

fn configure(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "PRAGMA foreign_keys = ON;
         PRAGMA busy_timeout = 5000;",
    )?;
    Ok(())
}

/// Run `f` inside a transaction
///
/// The transaction commits when `f` returns `Ok`. On `Err` the transaction
/// is dropped, which rolls back every statement `f` executed.
pub fn transaction<T, E, F>(conn: &mut Connection, f: F) -> std::result::Result<T, E>
where
    F: FnOnce(&Transaction) -> std::result::Result<T, E>,
    E: From<Error>,
{
    let tx = conn.transaction().map_err(Error::from)?;
    let value = f(&tx)?;
    tx.commit().map_err(Error::from)?;
    Ok(value)
}
