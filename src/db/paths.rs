// src/db/paths.rs
//! Centralized path derivation for the transfer database and its side files

use std::path::{Path, PathBuf};

/// Default location of the transfer database
pub const DEFAULT_DB_PATH: &str = "/var/lib/transfers/transfers.db";

/// Get the directory containing the database
///
/// `TRANSFERS_DB_DIR` overrides the directory derived from `db_path`.
pub fn db_dir(db_path: &str) -> PathBuf {
    std::env::var("TRANSFERS_DB_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            Path::new(db_path)
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or(Path::new("/var/lib/transfers"))
                .to_path_buf()
        })
}

/// Get the default location of the secret key file
pub fn key_file(db_path: &str) -> PathBuf {
    db_dir(db_path).join("secret.key")
}
