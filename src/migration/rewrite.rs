// src/migration/rewrite.rs

//! Reference rewriter - point configurations at their new providers
//!
//! Inline connection columns are left in place; only the provider references
//! change, so a rollback only has to put the old row back.

use super::descriptor::DescriptorMap;
use super::error::MigrationError;
use super::options::RunOptions;
use super::sanitize::Sanitizer;
use crate::db::models::{Direction, TransferConfig};
use rusqlite::Connection;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Provider IDs to set on one configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReferenceUpdate {
    pub source: Option<i64>,
    pub destination: Option<i64>,
}

impl ReferenceUpdate {
    fn set(&mut self, direction: Direction, provider_id: i64) {
        match direction {
            Direction::Source => self.source = Some(provider_id),
            Direction::Destination => self.destination = Some(provider_id),
        }
    }

    fn get(&self, direction: Direction) -> Option<i64> {
        match direction {
            Direction::Source => self.source,
            Direction::Destination => self.destination,
        }
    }
}

/// Output of the rewrite phase
#[derive(Debug, Default)]
pub struct Rewrite {
    pub configs_updated: usize,
    pub missing_configs: Vec<i64>,
    pub warnings: Vec<String>,
}

/// Collect the per-configuration updates implied by resolved descriptors
pub fn plan_updates(descriptors: &DescriptorMap) -> Result<BTreeMap<i64, ReferenceUpdate>, MigrationError> {
    let mut updates: BTreeMap<i64, ReferenceUpdate> = BTreeMap::new();

    for (key, descriptor) in descriptors {
        let provider_id = descriptor.resolved_provider_id.ok_or_else(|| {
            MigrationError::ReferenceUpdate(format!(
                "no provider was created for {} descriptor of config {}",
                key.direction, descriptor.first_config_id
            ))
        })?;

        for config_id in &descriptor.referencing_config_ids {
            updates
                .entry(*config_id)
                .or_default()
                .set(descriptor.direction, provider_id);
        }
    }

    Ok(updates)
}

/// Set provider references on every configuration a descriptor points at
pub fn rewrite_references(
    tx: &Connection,
    descriptors: &DescriptorMap,
    options: &RunOptions,
) -> Result<Rewrite, MigrationError> {
    let updates = plan_updates(descriptors)?;
    info!("Updating provider references on {} configurations", updates.len());

    let sanitizer = Sanitizer::new(options.debug_mode);
    let mut rewrite = Rewrite::default();

    for (config_id, update) in &updates {
        let found = TransferConfig::find_by_id(tx, *config_id).map_err(|e| {
            MigrationError::ReferenceUpdate(
                sanitizer.sanitize(&format!("failed to read config {}: {}", config_id, e)),
            )
        })?;

        let Some(mut config) = found else {
            let message = format!(
                "Transfer configuration {} disappeared during migration; its references were not updated",
                config_id
            );
            warn!("{}", message);
            rewrite.warnings.push(message);
            rewrite.missing_configs.push(*config_id);
            continue;
        };

        for direction in Direction::BOTH {
            if let Some(provider_id) = update.get(direction) {
                config.endpoint_mut(direction).provider_id = Some(provider_id);
            }
        }

        config.save(tx).map_err(|e| {
            MigrationError::ReferenceUpdate(
                sanitizer.sanitize(&format!("failed to update config {}: {}", config_id, e)),
            )
        })?;

        debug!(
            "Config {} now references source {:?} and destination {:?}",
            config_id,
            config.source.provider_id,
            config.destination.provider_id
        );
        rewrite.configs_updated += 1;
    }

    Ok(rewrite)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::db::models::{ConnectionFields, Endpoint, ProviderType};
    use crate::migration::descriptor::ProviderDescriptor;
    use std::collections::BTreeSet;

    fn descriptor(direction: Direction, ids: &[i64], provider_id: Option<i64>) -> ProviderDescriptor {
        ProviderDescriptor {
            direction,
            provider_type: ProviderType::Local,
            connection: ConnectionFields::default(),
            dedup_key: format!("local|{}", ids[0]),
            referencing_config_ids: ids.iter().copied().collect::<BTreeSet<_>>(),
            owner_id: 1,
            first_config_id: ids[0],
            first_config_name: "c".into(),
            resolved_provider_id: provider_id,
            divergent_secrets: false,
            rejected_port: None,
        }
    }

    fn map(descriptors: Vec<ProviderDescriptor>) -> DescriptorMap {
        descriptors.into_iter().map(|d| (d.key(), d)).collect()
    }

    #[test]
    fn test_plan_groups_both_directions() {
        let descriptors = map(vec![
            descriptor(Direction::Source, &[1, 2], Some(10)),
            descriptor(Direction::Destination, &[1], Some(11)),
        ]);

        let updates = plan_updates(&descriptors).unwrap();
        assert_eq!(
            updates[&1],
            ReferenceUpdate {
                source: Some(10),
                destination: Some(11)
            }
        );
        assert_eq!(
            updates[&2],
            ReferenceUpdate {
                source: Some(10),
                destination: None
            }
        );
    }

    #[test]
    fn test_unresolved_descriptor_is_error() {
        let descriptors = map(vec![descriptor(Direction::Source, &[1], None)]);
        let err = plan_updates(&descriptors).unwrap_err();
        assert!(matches!(err, MigrationError::ReferenceUpdate(_)));
    }

    #[test]
    fn test_missing_config_is_warning() {
        let conn = db::open_in_memory().unwrap();
        let mut config = TransferConfig::new(
            "kept".into(),
            1,
            Endpoint::new(ProviderType::Local),
            Endpoint::new(ProviderType::Local),
        );
        let id = config.insert(&conn).unwrap();
        conn.execute(
            "INSERT INTO storage_providers (name, type, owner_id) VALUES ('p', 'local', 1)",
            [],
        )
        .unwrap();
        let provider_id = conn.last_insert_rowid();

        let descriptors = map(vec![descriptor(Direction::Source, &[id, 999], Some(provider_id))]);
        let rewrite = rewrite_references(&conn, &descriptors, &RunOptions::default()).unwrap();

        assert_eq!(rewrite.configs_updated, 1);
        assert_eq!(rewrite.missing_configs, vec![999]);
        assert_eq!(rewrite.warnings.len(), 1);

        let reloaded = TransferConfig::find_by_id(&conn, id).unwrap().unwrap();
        assert_eq!(reloaded.source.provider_id, Some(provider_id));
        assert_eq!(reloaded.destination.provider_id, None);
    }
}
