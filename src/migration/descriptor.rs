// src/migration/descriptor.rs

//! Credential normalizer
//!
//! Turns one side of a legacy transfer configuration into a
//! [`ProviderDescriptor`]: a direction- and type-tagged, normalized copy of
//! its connection details plus the dedup key that identifies it.

use super::strategy::StrategyRegistry;
use crate::db::models::{ConnectionField, ConnectionFields, Direction, ProviderType, TransferConfig};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Map key for a descriptor: dedup keys are scoped per direction
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DescriptorKey {
    pub direction: Direction,
    pub dedup_key: String,
}

impl fmt::Display for DescriptorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.direction, self.dedup_key)
    }
}

/// Deduplicated descriptors of one migration run
pub type DescriptorMap = BTreeMap<DescriptorKey, ProviderDescriptor>;

/// In-memory, run-scoped view of one unique credential set
#[derive(Debug, Clone)]
pub struct ProviderDescriptor {
    pub direction: Direction,
    pub provider_type: ProviderType,
    /// Normalized connection details; secrets are still plaintext here
    pub connection: ConnectionFields,
    pub dedup_key: String,
    pub referencing_config_ids: BTreeSet<i64>,
    pub owner_id: i64,
    /// First configuration that produced this descriptor
    pub first_config_id: i64,
    pub first_config_name: String,
    /// Set by the provider creator
    pub resolved_provider_id: Option<i64>,
    /// A merged configuration carried a different secret than the first one
    pub divergent_secrets: bool,
    /// Out-of-range port read from the configuration, dropped before keying
    pub rejected_port: Option<i64>,
}

impl ProviderDescriptor {
    pub fn key(&self) -> DescriptorKey {
        DescriptorKey {
            direction: self.direction,
            dedup_key: self.dedup_key.clone(),
        }
    }

    /// Merge another descriptor with the same key into this one
    ///
    /// Only the referencing IDs are taken over; the first-seen secrets win.
    /// Returns the secret fields whose values disagreed.
    pub fn merge(&mut self, other: &ProviderDescriptor) -> Vec<ConnectionField> {
        self.referencing_config_ids
            .extend(other.referencing_config_ids.iter().copied());

        let divergent: Vec<ConnectionField> = other
            .connection
            .present_secrets()
            .filter(|(field, value)| self.connection.text(*field) != Some(*value))
            .map(|(field, _)| field)
            .collect();
        if !divergent.is_empty() {
            self.divergent_secrets = true;
        }
        divergent
    }

    /// Plaintext secret values, used to scrub error messages
    pub fn secret_values(&self) -> Vec<String> {
        self.connection
            .present_secrets()
            .map(|(_, value)| value.to_string())
            .collect()
    }
}

/// Trim every text field, dropping values that end up empty
fn trim_fields(fields: &mut ConnectionFields) {
    for field in ConnectionField::ALL {
        let slot = fields.text_mut(field);
        if let Some(value) = slot.take() {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                *slot = Some(trimmed.to_string());
            }
        }
    }
}

/// Build the descriptor for one side of a configuration
///
/// Returns `None` when that side already references a provider, or when the
/// configuration was never persisted.
pub fn normalize(
    registry: &StrategyRegistry,
    config: &TransferConfig,
    direction: Direction,
) -> Option<ProviderDescriptor> {
    let config_id = config.id?;
    let endpoint = config.endpoint(direction);
    if endpoint.uses_provider() {
        return None;
    }

    let provider_type = endpoint.provider_type.clone();
    let strategy = registry.get(&provider_type);

    let mut connection = endpoint.connection.clone();
    let rejected_port = connection.invalid_port();
    if rejected_port.is_some() {
        connection.port = None;
    }
    trim_fields(&mut connection);
    strategy.normalize(&mut connection);

    let dedup_key = strategy.build_key(&provider_type, &connection, config.owner_id);

    Some(ProviderDescriptor {
        direction,
        provider_type,
        connection,
        dedup_key,
        referencing_config_ids: BTreeSet::from([config_id]),
        owner_id: config.owner_id,
        first_config_id: config_id,
        first_config_name: config.name.clone(),
        resolved_provider_id: None,
        divergent_secrets: false,
        rejected_port,
    })
}
