// src/migration/extract.rs

//! Extractor - discover and deduplicate inline credential sets

use super::descriptor::{DescriptorMap, normalize};
use super::strategy::StrategyRegistry;
use crate::db::models::{Direction, TransferConfig};
use crate::error::Result;
use rusqlite::Connection;
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use tracing::{debug, info, warn};

/// Output of the extraction phase
#[derive(Debug, Default)]
pub struct Extraction {
    pub descriptors: DescriptorMap,
    pub total_configs: usize,
    pub unique_source_providers: usize,
    pub unique_destination_providers: usize,
    /// Unique descriptors per type tag, per direction
    pub source_by_type: BTreeMap<String, usize>,
    pub destination_by_type: BTreeMap<String, usize>,
    pub warnings: Vec<String>,
}

impl Extraction {
    /// Nothing left to migrate
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

/// Read every configuration and group its legacy sides by dedup key
///
/// Read-only. Configurations are visited in ID order, so the lowest ID that
/// shares a key supplies the merged descriptor's secrets and name.
pub fn extract(conn: &Connection, registry: &StrategyRegistry) -> Result<Extraction> {
    let configs = TransferConfig::list_all(conn)?;
    info!("Extracting credentials from {} transfer configurations", configs.len());

    let mut extraction = Extraction {
        total_configs: configs.len(),
        ..Default::default()
    };

    for config in &configs {
        for direction in Direction::BOTH {
            let Some(descriptor) = normalize(registry, config, direction) else {
                continue;
            };

            if let Some(port) = descriptor.rejected_port {
                let message = format!(
                    "config {} ({}): port {} is not a valid TCP port; the {} default is used instead",
                    descriptor.first_config_id, direction, port, descriptor.provider_type
                );
                warn!("{}", message);
                extraction.warnings.push(message);
            }

            match extraction.descriptors.entry(descriptor.key()) {
                Entry::Vacant(slot) => {
                    debug!(
                        "New {} descriptor {} from config {}",
                        direction, descriptor.dedup_key, descriptor.first_config_id
                    );
                    let by_type = match direction {
                        Direction::Source => &mut extraction.source_by_type,
                        Direction::Destination => &mut extraction.destination_by_type,
                    };
                    *by_type
                        .entry(descriptor.provider_type.to_string())
                        .or_insert(0) += 1;
                    slot.insert(descriptor);
                }
                Entry::Occupied(mut slot) => {
                    let existing = slot.get_mut();
                    let divergent = existing.merge(&descriptor);
                    if !divergent.is_empty() {
                        let fields: Vec<&str> = divergent.iter().map(|f| f.column()).collect();
                        let message = format!(
                            "{} {} credentials shared by configs {} and {} differ in {}; keeping the values from config {}",
                            existing.provider_type,
                            direction,
                            existing.first_config_id,
                            descriptor.first_config_id,
                            fields.join(", "),
                            existing.first_config_id
                        );
                        warn!("{}", message);
                        extraction.warnings.push(message);
                    }
                }
            }
        }
    }

    extraction.unique_source_providers = extraction.source_by_type.values().sum();
    extraction.unique_destination_providers = extraction.destination_by_type.values().sum();

    info!(
        "Found {} unique source and {} unique destination credential sets",
        extraction.unique_source_providers, extraction.unique_destination_providers
    );
    Ok(extraction)
}
