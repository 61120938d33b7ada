// src/migration/mod.rs

//! Credential to provider migration
//!
//! Legacy transfer configurations carry their connection details inline, one
//! copy per configuration and side. This module finds every distinct set,
//! creates one shared [`StorageProvider`](crate::db::models::StorageProvider)
//! per set with its secrets encrypted, points each configuration at its
//! providers and verifies the result. [`MigrationEngine`] is the entry point.
//!
//! Phases live in their own modules:
//!
//! - `extract`: read configurations and deduplicate their credential sets
//! - `create`: insert providers
//! - `rewrite`: set provider references on configurations
//! - `validate`: check that every configuration resolves through a provider
//! - `backup`: snapshot and rollback

mod backup;
mod create;
mod descriptor;
mod engine;
mod error;
mod extract;
mod options;
mod report;
mod rewrite;
mod sanitize;
mod stats;
mod strategy;
mod validate;

pub use backup::{MigrationBackup, RollbackSummary, rollback};
pub use create::{Creation, apply_provider_ids, create_providers};
pub use descriptor::{DescriptorKey, DescriptorMap, ProviderDescriptor, normalize};
pub use engine::MigrationEngine;
pub use error::{MigrationError, MigrationFailure};
pub use extract::{Extraction, extract};
pub use options::RunOptions;
pub use report::format_report;
pub use rewrite::{ReferenceUpdate, Rewrite, plan_updates, rewrite_references};
pub use sanitize::{GENERIC_MESSAGE, REDACTED, SENSITIVE_KEYWORDS, Sanitizer};
pub use stats::{MigrationPhase, MigrationStats};
pub use strategy::{
    FallbackStrategy, HostStrategy, LocalStrategy, OAuthStrategy, ObjectStorageStrategy,
    PLACEHOLDER_ACCESS_KEY, PLACEHOLDER_HOST, PLACEHOLDER_REGION, PLACEHOLDER_SHARE,
    PLACEHOLDER_USERNAME, ProviderStrategy, ShareStrategy, StrategyRegistry, generic_name,
};
pub use validate::{ValidationReport, validate};
