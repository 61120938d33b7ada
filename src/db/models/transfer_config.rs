// src/db/models/transfer_config.rs

//! Transfer configuration model
//!
//! A transfer configuration describes one scheduled copy from a source to a
//! destination. Older rows carry the connection details of each side inline;
//! migrated rows point at a shared storage provider instead. Both shapes can
//! coexist on one row while a migration is in progress.

use super::connection::{ConnectionFields, ProviderType};
use crate::error::{Error, Result};
use rusqlite::types::ToSql;
use rusqlite::{Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which side of a transfer a set of connection details belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Source,
    Destination,
}

impl Direction {
    pub const BOTH: [Direction; 2] = [Direction::Source, Direction::Destination];

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Source => "source",
            Direction::Destination => "destination",
        }
    }

    /// Human label used in generated provider names
    pub fn label(&self) -> &'static str {
        match self {
            Direction::Source => "Source",
            Direction::Destination => "Destination",
        }
    }

    /// Column prefix of this side in `transfer_configs`
    pub fn column_prefix(&self) -> &'static str {
        match self {
            Direction::Source => "source_",
            Direction::Destination => "dest_",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One side of a transfer configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub provider_type: ProviderType,
    /// Remote path; belongs to the configuration, never to a provider
    pub path: Option<String>,
    /// Inline (legacy) connection details
    pub connection: ConnectionFields,
    /// Reference to `storage_providers(id)`
    pub provider_id: Option<i64>,
}

impl Endpoint {
    pub fn new(provider_type: ProviderType) -> Self {
        Self {
            provider_type,
            path: None,
            connection: ConnectionFields::default(),
            provider_id: None,
        }
    }

    /// A side uses a provider only when the reference is set and non-zero
    pub fn uses_provider(&self) -> bool {
        self.provider_id.is_some_and(|id| id > 0)
    }

    fn from_row(row: &Row, direction: Direction) -> rusqlite::Result<Self> {
        let prefix = direction.column_prefix();
        let type_tag: String = row.get(format!("{}type", prefix).as_str())?;
        Ok(Self {
            provider_type: ProviderType::parse(&type_tag),
            path: row.get(format!("{}path", prefix).as_str())?,
            connection: ConnectionFields::from_row(row, prefix)?,
            provider_id: row.get(format!("{}provider_id", prefix).as_str())?,
        })
    }
}

/// A scheduled transfer configuration row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferConfig {
    pub id: Option<i64>,
    pub name: String,
    pub owner_id: i64,
    pub schedule: Option<String>,
    pub enabled: bool,
    pub source: Endpoint,
    pub destination: Endpoint,
    pub created_at: Option<String>,
}

/// Non-connection columns, in bind order
const BASE_COLUMNS: [&str; 4] = ["name", "owner_id", "schedule", "enabled"];

impl TransferConfig {
    /// Create a new transfer configuration
    pub fn new(name: String, owner_id: i64, source: Endpoint, destination: Endpoint) -> Self {
        Self {
            id: None,
            name,
            owner_id,
            schedule: None,
            enabled: true,
            source,
            destination,
            created_at: None,
        }
    }

    pub fn endpoint(&self, direction: Direction) -> &Endpoint {
        match direction {
            Direction::Source => &self.source,
            Direction::Destination => &self.destination,
        }
    }

    pub fn endpoint_mut(&mut self, direction: Direction) -> &mut Endpoint {
        match direction {
            Direction::Source => &mut self.source,
            Direction::Destination => &mut self.destination,
        }
    }

    /// Both sides reference a provider
    pub fn is_fully_migrated(&self) -> bool {
        self.source.uses_provider() && self.destination.uses_provider()
    }

    fn columns() -> Vec<String> {
        let mut columns: Vec<String> = BASE_COLUMNS.iter().map(|c| c.to_string()).collect();
        for direction in Direction::BOTH {
            let prefix = direction.column_prefix();
            columns.push(format!("{}type", prefix));
            columns.push(format!("{}path", prefix));
            columns.push(format!("{}provider_id", prefix));
            columns.extend(ConnectionFields::columns(prefix));
        }
        columns
    }

    /// Values in `columns()` order; type tags are passed in so they outlive the slice
    fn values<'a>(&'a self, type_tags: &'a [String; 2]) -> Vec<&'a dyn ToSql> {
        let mut values: Vec<&dyn ToSql> = Vec::with_capacity(BASE_COLUMNS.len() + 40);
        values.push(&self.name);
        values.push(&self.owner_id);
        values.push(&self.schedule);
        values.push(&self.enabled);
        for (direction, tag) in Direction::BOTH.iter().zip(type_tags.iter()) {
            let endpoint = self.endpoint(*direction);
            values.push(tag);
            values.push(&endpoint.path);
            values.push(&endpoint.provider_id);
            values.extend(endpoint.connection.sql_values());
        }
        values
    }

    fn type_tags(&self) -> [String; 2] {
        [
            self.source.provider_type.as_str().to_string(),
            self.destination.provider_type.as_str().to_string(),
        ]
    }

    /// Insert this configuration into the database
    pub fn insert(&mut self, conn: &Connection) -> Result<i64> {
        let columns = Self::columns();
        let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{}", i)).collect();
        let sql = format!(
            "INSERT INTO transfer_configs ({}) VALUES ({})",
            columns.join(", "),
            placeholders.join(", ")
        );

        let tags = self.type_tags();
        conn.execute(&sql, self.values(&tags).as_slice())?;

        let id = conn.last_insert_rowid();
        self.id = Some(id);
        Ok(id)
    }

    /// Write every column of this configuration back to its row
    pub fn save(&self, conn: &Connection) -> Result<()> {
        let id = self.id.ok_or_else(|| {
            Error::InitError("Cannot save transfer configuration without ID".to_string())
        })?;

        let columns = Self::columns();
        let assignments: Vec<String> = columns
            .iter()
            .enumerate()
            .map(|(i, column)| format!("{} = ?{}", column, i + 1))
            .collect();
        let sql = format!(
            "UPDATE transfer_configs SET {} WHERE id = ?{}",
            assignments.join(", "),
            columns.len() + 1
        );

        let tags = self.type_tags();
        let mut values = self.values(&tags);
        values.push(&id);

        let updated = conn.execute(&sql, values.as_slice())?;
        if updated == 0 {
            return Err(Error::NotFoundError(format!("transfer configuration {}", id)));
        }
        Ok(())
    }

    /// Set only the provider reference of one side
    pub fn set_provider_ref(
        conn: &Connection,
        id: i64,
        direction: Direction,
        provider_id: Option<i64>,
    ) -> Result<()> {
        let sql = format!(
            "UPDATE transfer_configs SET {}provider_id = ?1 WHERE id = ?2",
            direction.column_prefix()
        );
        conn.execute(&sql, rusqlite::params![provider_id, id])?;
        Ok(())
    }

    /// Find a configuration by ID
    pub fn find_by_id(conn: &Connection, id: i64) -> Result<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM transfer_configs WHERE id = ?1")?;
        let config = stmt.query_row([id], Self::from_row).optional()?;
        Ok(config)
    }

    /// Look up only the name of a configuration
    pub fn find_name(conn: &Connection, id: i64) -> Result<Option<String>> {
        let name = conn
            .query_row(
                "SELECT name FROM transfer_configs WHERE id = ?1",
                [id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(name)
    }

    /// List all configurations ordered by ID
    pub fn list_all(conn: &Connection) -> Result<Vec<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM transfer_configs ORDER BY id")?;

        let configs = stmt
            .query_map([], Self::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(configs)
    }

    /// Delete a configuration by ID
    pub fn delete(conn: &Connection, id: i64) -> Result<()> {
        conn.execute("DELETE FROM transfer_configs WHERE id = ?1", [id])?;
        Ok(())
    }

    /// Total number of configurations
    pub fn count(conn: &Connection) -> Result<i64> {
        let count = conn.query_row("SELECT COUNT(*) FROM transfer_configs", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Number of configurations with at least one side still inline
    pub fn count_legacy(conn: &Connection) -> Result<i64> {
        let count = conn.query_row(
            "SELECT COUNT(*) FROM transfer_configs
             WHERE COALESCE(source_provider_id, 0) = 0 OR COALESCE(dest_provider_id, 0) = 0",
            [],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Number of configurations whose sides both reference a provider
    pub fn count_migrated(conn: &Connection) -> Result<i64> {
        let count = conn.query_row(
            "SELECT COUNT(*) FROM transfer_configs
             WHERE COALESCE(source_provider_id, 0) > 0 AND COALESCE(dest_provider_id, 0) > 0",
            [],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Convert a database row to a TransferConfig
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: Some(row.get("id")?),
            name: row.get("name")?,
            owner_id: row.get("owner_id")?,
            schedule: row.get("schedule")?,
            enabled: row.get("enabled")?,
            source: Endpoint::from_row(row, Direction::Source)?,
            destination: Endpoint::from_row(row, Direction::Destination)?,
            created_at: row.get("created_at")?,
        })
    }
}
