// src/migration/error.rs
//! Error types for the provider migration engine

use super::stats::MigrationStats;
use thiserror::Error;

/// Terminal errors of a migration run
///
/// Every message carried here has already been through the sanitizer.
#[derive(Error, Debug)]
pub enum MigrationError {
    /// Reading configurations failed; nothing was changed
    #[error("Extraction failed: {0}")]
    Extraction(String),

    /// The pre-migration snapshot could not be taken or written
    #[error("Backup failed: {0}")]
    Backup(String),

    /// A provider could not be created; the creation transaction was rolled back
    #[error("Provider creation failed: {0}")]
    ProviderCreation(String),

    /// A configuration could not be rewritten; the rewrite transaction was rolled back
    #[error("Reference update failed: {0}")]
    ReferenceUpdate(String),

    /// Post-migration validation found problems and the run was not forced
    #[error("Post-migration validation failed for {invalid_configs} configuration(s)")]
    Validation { invalid_configs: usize },

    /// Unclassified database failure (transaction begin/commit, validator reads)
    #[error("Database error: {0}")]
    Database(String),
}

/// A failed run: the terminal error plus whatever statistics were gathered
#[derive(Error, Debug)]
#[error("{error}")]
pub struct MigrationFailure {
    pub stats: MigrationStats,
    #[source]
    pub error: MigrationError,
}
