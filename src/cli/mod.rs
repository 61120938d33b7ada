// src/cli/mod.rs
//! CLI definitions for provider-migrate
//!
//! This module contains the command-line interface definitions using clap.
//! The actual command implementations are in the `commands` module.
//!
//! - `init` - Create or upgrade the database schema
//! - `status` - Show how far the migration has progressed
//! - `migrate` - Move inline credentials into storage providers
//! - `validate` - Check configurations against their providers
//! - `providers` - List storage providers

use clap::{ArgAction, Parser, Subcommand};
use provider_migrate::db::paths::DEFAULT_DB_PATH;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "provider-migrate")]
#[command(author = "Transfer Scheduler Contributors")]
#[command(version)]
#[command(about = "Move inline transfer credentials into shared, encrypted storage providers", long_about = None)]
pub struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the database or upgrade its schema
    Init {
        /// Path to the database file
        #[arg(short, long, default_value = DEFAULT_DB_PATH)]
        db_path: String,
    },

    /// Show configuration and provider counts
    Status {
        /// Path to the database file
        #[arg(short, long, default_value = DEFAULT_DB_PATH)]
        db_path: String,
    },

    /// Migrate inline credentials to storage providers
    Migrate {
        /// Path to the database file
        #[arg(short, long, default_value = DEFAULT_DB_PATH)]
        db_path: String,

        /// File holding the encryption passphrase (default: PROVIDER_MIGRATE_KEY, then <db dir>/secret.key)
        #[arg(short, long)]
        key_file: Option<PathBuf>,

        /// Load run options from a TOML file; flags below override it
        #[arg(long)]
        options: Option<PathBuf>,

        /// Report what would be migrated without making changes
        #[arg(long)]
        dry_run: bool,

        /// Validate current storage without making changes
        #[arg(long)]
        validation_only: bool,

        /// Finish the run even if post-migration validation fails
        #[arg(long)]
        force: bool,

        /// Also write the pre-migration snapshot to this directory
        #[arg(long)]
        backup_dir: Option<PathBuf>,

        /// Keep field names in error messages, redacting only values
        #[arg(long)]
        debug: bool,

        /// Fail instead of filling missing required fields with placeholders
        #[arg(long)]
        no_auto_fill: bool,

        /// Print run statistics as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate that every configuration resolves through a provider
    Validate {
        /// Path to the database file
        #[arg(short, long, default_value = DEFAULT_DB_PATH)]
        db_path: String,

        /// File holding the encryption passphrase
        #[arg(short, long)]
        key_file: Option<PathBuf>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// List storage providers
    Providers {
        /// Path to the database file
        #[arg(short, long, default_value = DEFAULT_DB_PATH)]
        db_path: String,
    },
}
