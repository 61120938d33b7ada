// src/migration/stats.rs

//! Run statistics returned by every migration invocation

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Orchestrator phases, in the order a successful run visits them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MigrationPhase {
    Started,
    Extracted,
    ProvidersCreated,
    ReferencesUpdated,
    Validated,
    RolledBack,
    Done,
}

impl MigrationPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            MigrationPhase::Started => "started",
            MigrationPhase::Extracted => "extracted",
            MigrationPhase::ProvidersCreated => "providers_created",
            MigrationPhase::ReferencesUpdated => "references_updated",
            MigrationPhase::Validated => "validated",
            MigrationPhase::RolledBack => "rolled_back",
            MigrationPhase::Done => "done",
        }
    }
}

impl fmt::Display for MigrationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Counters and findings for one run; never persisted
#[derive(Debug, Clone, Serialize)]
pub struct MigrationStats {
    pub total_configs: usize,
    pub unique_source_providers: usize,
    pub unique_destination_providers: usize,
    pub source_by_type: BTreeMap<String, usize>,
    pub destination_by_type: BTreeMap<String, usize>,
    pub providers_created: usize,
    pub configs_updated: usize,
    pub auto_filled: usize,
    pub phase: MigrationPhase,
    pub rolled_back: bool,
    pub dry_run: bool,
    pub validation_only: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl MigrationStats {
    pub fn new() -> Self {
        Self {
            total_configs: 0,
            unique_source_providers: 0,
            unique_destination_providers: 0,
            source_by_type: BTreeMap::new(),
            destination_by_type: BTreeMap::new(),
            providers_created: 0,
            configs_updated: 0,
            auto_filled: 0,
            phase: MigrationPhase::Started,
            rolled_back: false,
            dry_run: false,
            validation_only: false,
            errors: Vec::new(),
            warnings: Vec::new(),
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Record the terminal phase and end time
    pub fn finish(&mut self, phase: MigrationPhase) {
        self.phase = phase;
        self.finished_at = Some(Utc::now());
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Wall-clock run time, if the run finished
    pub fn duration(&self) -> Option<chrono::Duration> {
        self.finished_at.map(|end| end - self.started_at)
    }
}

impl Default for MigrationStats {
    fn default() -> Self {
        Self::new()
    }
}
