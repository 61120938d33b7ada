// src/error.rs

//! Error types shared by the database, crypto and migration layers

use thiserror::Error;

/// Errors raised by the persistence and encryption collaborators
#[derive(Error, Debug)]
pub enum Error {
    /// SQLite failure
    #[error("Database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    /// I/O failure (backup files, key files)
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON encoding/decoding failure
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Invalid run options or key material
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Encrypt/decrypt failure reported by the cipher
    #[error("Encryption error: {0}")]
    EncryptionError(String),

    /// A row that was expected to exist is gone
    #[error("Not found: {0}")]
    NotFoundError(String),

    /// A provider row is missing a field its type requires
    #[error("Missing required field '{field}' for {provider_type} provider")]
    MissingRequiredField {
        provider_type: String,
        field: &'static str,
    },

    /// Database initialization failure
    #[error("Initialization error: {0}")]
    InitError(String),
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;
