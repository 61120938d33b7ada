// src/lib.rs

//! Storage provider migration for scheduled file transfers
//!
//! Transfer configurations used to store connection details (hosts,
//! usernames, passwords, keys, OAuth tokens) inline on every row. This crate
//! moves them into shared, deduplicated storage providers with encrypted
//! secrets and repoints every configuration at its providers.
//!
//! # Architecture
//!
//! - Database-first: configurations and providers live in one SQLite file
//! - One transaction per mutating phase, with a snapshot rollback on failure
//! - Per-type strategies decide how credentials are normalized and deduplicated
//! - Secrets are encrypted through an injected [`crypto::SecretCipher`]

pub mod credentials;
pub mod crypto;
pub mod db;
mod error;
pub mod migration;

pub use error::{Error, Result};
pub use migration::{
    MigrationEngine, MigrationError, MigrationFailure, MigrationPhase, MigrationStats, RunOptions,
    format_report,
};
