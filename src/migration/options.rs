// src/migration/options.rs

//! Run options threaded through every migration phase

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Options for one migration run
///
/// Can be loaded from a TOML file; missing keys take the defaults below.
///
/// ```toml
/// dry_run = false
/// validation_only = false
/// force = false
/// backup_dir = "/var/lib/transfers/backups"
/// debug_mode = false
/// auto_fill = true
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunOptions {
    /// Extract and report only; never mutate
    pub dry_run: bool,
    /// Extract and validate current storage; never mutate
    pub validation_only: bool,
    /// Complete the run even if post-migration validation fails
    pub force: bool,
    /// Also write the pre-migration snapshot to this directory
    pub backup_dir: Option<PathBuf>,
    /// Field-scoped instead of message-scoped error redaction
    pub debug_mode: bool,
    /// Fill missing required provider fields with placeholders
    pub auto_fill: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            validation_only: false,
            force: false,
            backup_dir: None,
            debug_mode: false,
            auto_fill: true,
        }
    }
}

impl RunOptions {
    /// Load options from a TOML file
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
            .map_err(|e| Error::ConfigError(format!("{}: {}", path.display(), e)))
    }

    pub fn from_toml_str(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}
