// src/db/models/storage_provider.rs

//! Storage provider model - shared, deduplicated connection records

use super::connection::{ConnectionFields, ProviderType};
use crate::error::{Error, Result};
use rusqlite::types::ToSql;
use rusqlite::{Connection, OptionalExtension, Row};
use serde::Serialize;

/// A normalized storage endpoint referenced by transfer configurations
///
/// Secret columns hold cipher text produced by the encryption gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StorageProvider {
    pub id: Option<i64>,
    pub name: String,
    pub provider_type: ProviderType,
    #[serde(skip)]
    pub connection: ConnectionFields,
    pub owner_id: i64,
    pub created_at: Option<String>,
}

impl StorageProvider {
    /// Create a new provider with empty connection details
    pub fn new(name: String, provider_type: ProviderType, owner_id: i64) -> Self {
        Self {
            id: None,
            name,
            provider_type,
            connection: ConnectionFields::default(),
            owner_id,
            created_at: None,
        }
    }

    /// Check the fields this provider's type requires
    pub fn check_required(&self) -> Result<()> {
        for field in self.provider_type.required_fields() {
            if self.connection.text(*field).is_none() {
                return Err(Error::MissingRequiredField {
                    provider_type: self.provider_type.to_string(),
                    field: field.column(),
                });
            }
        }
        Ok(())
    }

    /// Insert this provider into the database
    pub fn insert(&mut self, conn: &Connection) -> Result<i64> {
        self.check_required()?;

        let mut columns = vec!["name".to_string(), "type".to_string(), "owner_id".to_string()];
        columns.extend(ConnectionFields::columns(""));
        let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{}", i)).collect();
        let sql = format!(
            "INSERT INTO storage_providers ({}) VALUES ({})",
            columns.join(", "),
            placeholders.join(", ")
        );

        let type_tag = self.provider_type.as_str().to_string();
        let mut values: Vec<&dyn ToSql> = Vec::with_capacity(columns.len());
        values.push(&self.name);
        values.push(&type_tag);
        values.push(&self.owner_id);
        values.extend(self.connection.sql_values());

        conn.execute(&sql, values.as_slice())?;

        let id = conn.last_insert_rowid();
        self.id = Some(id);
        Ok(id)
    }

    /// Find a provider by ID
    pub fn find_by_id(conn: &Connection, id: i64) -> Result<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM storage_providers WHERE id = ?1")?;
        let provider = stmt.query_row([id], Self::from_row).optional()?;
        Ok(provider)
    }

    /// List all providers ordered by ID
    pub fn list_all(conn: &Connection) -> Result<Vec<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM storage_providers ORDER BY id")?;

        let providers = stmt
            .query_map([], Self::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(providers)
    }

    /// Delete a provider by ID
    ///
    /// Configuration references to it are cleared by the foreign key.
    pub fn delete(conn: &Connection, id: i64) -> Result<()> {
        conn.execute("DELETE FROM storage_providers WHERE id = ?1", [id])?;
        Ok(())
    }

    /// Total number of providers
    pub fn count(conn: &Connection) -> Result<i64> {
        let count = conn.query_row("SELECT COUNT(*) FROM storage_providers", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Number of configurations referencing this provider on either side
    pub fn reference_count(conn: &Connection, id: i64) -> Result<i64> {
        let count = conn.query_row(
            "SELECT COUNT(*) FROM transfer_configs
             WHERE source_provider_id = ?1 OR dest_provider_id = ?1",
            [id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Convert a database row to a StorageProvider
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let type_tag: String = row.get("type")?;
        Ok(Self {
            id: Some(row.get("id")?),
            name: row.get("name")?,
            provider_type: ProviderType::parse(&type_tag),
            connection: ConnectionFields::from_row(row, "")?,
            owner_id: row.get("owner_id")?,
            created_at: row.get("created_at")?,
        })
    }
}
