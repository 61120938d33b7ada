// src/migration/create.rs

//! Provider creator - persist one provider per unique descriptor
//!
//! Runs inside the orchestrator's creation transaction. A failure returns a
//! sanitized error and the orchestrator drops the transaction, so either
//! every provider of the run is inserted or none is.

use super::descriptor::{DescriptorKey, DescriptorMap, ProviderDescriptor};
use super::error::MigrationError;
use super::options::RunOptions;
use super::sanitize::{GENERIC_MESSAGE, Sanitizer};
use super::strategy::{ProviderStrategy, StrategyRegistry};
use crate::crypto::EncryptionGateway;
use crate::db::models::{StorageProvider, TransferConfig};
use crate::error::Error;
use rusqlite::Connection;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Output of the creation phase
#[derive(Debug, Default)]
pub struct Creation {
    pub provider_ids: BTreeMap<DescriptorKey, i64>,
    pub auto_filled: usize,
    pub warnings: Vec<String>,
}

/// Create a provider row for every descriptor
pub fn create_providers(
    tx: &Connection,
    gateway: &EncryptionGateway,
    registry: &StrategyRegistry,
    descriptors: &DescriptorMap,
    options: &RunOptions,
) -> Result<Creation, MigrationError> {
    info!("Creating {} storage providers", descriptors.len());
    let mut creation = Creation::default();

    for (key, descriptor) in descriptors {
        let strategy = registry.get(&descriptor.provider_type);
        let sanitizer = Sanitizer::new(options.debug_mode).with_secrets(descriptor.secret_values());

        let mut provider = build_provider(tx, strategy, descriptor);
        gateway
            .protect(&mut provider.connection)
            .map_err(|e| creation_error(&sanitizer, &provider, descriptor, &e))?;

        let provider_id = match provider.insert(tx) {
            Ok(id) => id,
            Err(Error::MissingRequiredField { .. }) if options.auto_fill => {
                let filled =
                    strategy.auto_fill_defaults(&descriptor.provider_type, &mut provider.connection);
                let id = provider
                    .insert(tx)
                    .map_err(|e| creation_error(&sanitizer, &provider, descriptor, &e))?;

                // The name embeds the configuration name, which is user text.
                let label = match sanitizer.sanitize(&provider.name) {
                    name if name == GENERIC_MESSAGE => format!("Provider {}", id),
                    name => format!("Provider {} '{}'", id, name),
                };
                let fields: Vec<&str> = filled.iter().map(|f| f.column()).collect();
                let message = format!(
                    "{} was created with placeholder values for {}; update it before the next transfer runs",
                    label,
                    fields.join(", ")
                );
                warn!("{}", message);
                creation.warnings.push(message);
                creation.auto_filled += 1;
                id
            }
            Err(e) => return Err(creation_error(&sanitizer, &provider, descriptor, &e)),
        };

        debug!(
            "Created {} provider {} for {} configuration(s)",
            descriptor.provider_type,
            provider_id,
            descriptor.referencing_config_ids.len()
        );
        creation.provider_ids.insert(key.clone(), provider_id);
    }

    Ok(creation)
}

/// Record created IDs on the descriptors after the creation transaction commits
pub fn apply_provider_ids(descriptors: &mut DescriptorMap, provider_ids: &BTreeMap<DescriptorKey, i64>) {
    for (key, descriptor) in descriptors.iter_mut() {
        descriptor.resolved_provider_id = provider_ids.get(key).copied();
    }
}

fn build_provider(
    tx: &Connection,
    strategy: &dyn ProviderStrategy,
    descriptor: &ProviderDescriptor,
) -> StorageProvider {
    // The name comes from the row as it is now; the descriptor copy may be stale.
    let config_name = match TransferConfig::find_name(tx, descriptor.first_config_id) {
        Ok(name) => name,
        Err(e) => {
            debug!(
                "Could not resolve name of config {}: {}",
                descriptor.first_config_id, e
            );
            None
        }
    };

    let name = strategy.generate_name(descriptor, config_name.as_deref());
    let mut provider = StorageProvider::new(name, descriptor.provider_type.clone(), descriptor.owner_id);
    provider.connection = descriptor.connection.clone();
    provider
}

fn creation_error(
    sanitizer: &Sanitizer,
    provider: &StorageProvider,
    descriptor: &ProviderDescriptor,
    error: &Error,
) -> MigrationError {
    let ids: Vec<String> = descriptor
        .referencing_config_ids
        .iter()
        .map(|id| id.to_string())
        .collect();
    let message = format!(
        "{} provider '{}' for config(s) {}: {}",
        descriptor.provider_type,
        provider.name,
        ids.join(", "),
        error
    );
    MigrationError::ProviderCreation(sanitizer.sanitize(&message))
}
