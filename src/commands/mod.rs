// src/commands/mod.rs
//! Command handlers for the provider-migrate CLI

mod init;
mod migrate;
mod providers;
mod status;
mod validate;

use anyhow::{Context, Result};
use provider_migrate::crypto::{AesGcmCipher, KEY_ENV_VAR, SecretCipher};
use provider_migrate::db::paths;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

pub use init::cmd_init;
pub use migrate::{MigrateFlags, cmd_migrate};
pub use providers::cmd_providers;
pub use status::cmd_status;
pub use validate::cmd_validate;

/// Load the cipher from, in order: `--key-file`, the environment, the
/// default key file next to the database
fn load_cipher(db_path: &str, key_file: Option<&Path>) -> Result<Arc<dyn SecretCipher>> {
    let cipher = if let Some(path) = key_file {
        debug!("Reading encryption passphrase from {}", path.display());
        AesGcmCipher::from_key_file(path)
            .with_context(|| format!("Failed to load key file {}", path.display()))?
    } else if std::env::var_os(KEY_ENV_VAR).is_some() {
        debug!("Reading encryption passphrase from {}", KEY_ENV_VAR);
        AesGcmCipher::from_env().context("Failed to load encryption passphrase")?
    } else {
        let path = paths::key_file(db_path);
        AesGcmCipher::from_key_file(&path).with_context(|| {
            format!(
                "No encryption passphrase: pass --key-file, set {}, or create {}",
                KEY_ENV_VAR,
                path.display()
            )
        })?
    };
    Ok(Arc::new(cipher))
}
