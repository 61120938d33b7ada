// src/migration/strategy.rs

//! Per-provider-type rules
//!
//! Each provider type identifies a remote endpoint by different fields, so
//! normalization, dedup keys, display names and placeholder values live in
//! one [`ProviderStrategy`] per type family. [`StrategyRegistry`] maps type
//! tags to strategies and falls back to a generic host-based strategy for
//! tags it does not know.

use super::descriptor::ProviderDescriptor;
use crate::db::models::{ConnectionField, ConnectionFields, Direction, ProviderType};
use std::collections::HashMap;
use std::sync::Arc;

/// Placeholder host written by auto-fill
pub const PLACEHOLDER_HOST: &str = "placeholder.example.com";
/// Placeholder username written by auto-fill
pub const PLACEHOLDER_USERNAME: &str = "placeholder";
/// Placeholder region written by auto-fill for object storage
pub const PLACEHOLDER_REGION: &str = "us-east-1";
/// Placeholder access key written by auto-fill for object storage
pub const PLACEHOLDER_ACCESS_KEY: &str = "PLACEHOLDER_ACCESS_KEY";
/// Placeholder share written by auto-fill for SMB
pub const PLACEHOLDER_SHARE: &str = "placeholder";

/// Rules for one family of provider types
pub trait ProviderStrategy: Send + Sync {
    /// Type-specific cleanup applied after generic trimming
    fn normalize(&self, _fields: &mut ConnectionFields) {}

    /// Composite key; equal keys mean the same credential set
    ///
    /// Secret values never take part in the key.
    fn build_key(&self, provider_type: &ProviderType, fields: &ConnectionFields, owner_id: i64)
    -> String;

    /// Short description of the endpoint used in provider names
    fn identity(&self, fields: &ConnectionFields, owner_id: i64) -> String;

    /// Placeholder value for a required field, if this strategy has one
    fn placeholder(&self, _field: ConnectionField) -> Option<&'static str> {
        None
    }

    /// Provider name for a descriptor
    ///
    /// `config_name` is the name of the first referencing configuration, or
    /// `None` when it could not be resolved.
    fn generate_name(&self, descriptor: &ProviderDescriptor, config_name: Option<&str>) -> String {
        let identity = self.identity(&descriptor.connection, descriptor.owner_id);
        match config_name.map(str::trim).filter(|n| !n.is_empty()) {
            Some(name) => format!(
                "{} {} - {} ({})",
                name,
                descriptor.direction.label(),
                descriptor.provider_type,
                identity
            ),
            None => generic_name(descriptor.direction, &descriptor.provider_type, &identity),
        }
    }

    /// Fill missing required fields with deterministic placeholders
    ///
    /// Returns the fields that were filled.
    fn auto_fill_defaults(
        &self,
        provider_type: &ProviderType,
        fields: &mut ConnectionFields,
    ) -> Vec<ConnectionField> {
        let mut filled = Vec::new();
        for field in provider_type.required_fields() {
            if fields.text(*field).is_some() {
                continue;
            }
            if let Some(value) = self.placeholder(*field) {
                *fields.text_mut(*field) = Some(value.to_string());
                filled.push(*field);
            }
        }
        filled
    }
}

/// Name used when the first referencing configuration cannot be resolved
pub fn generic_name(direction: Direction, provider_type: &ProviderType, identity: &str) -> String {
    format!(
        "Migrated {} Provider - {} ({})",
        direction.label(),
        provider_type,
        identity
    )
}

fn part(value: Option<&str>) -> &str {
    value.unwrap_or("")
}

/// Join key components with `|`
///
/// Backslashes and separators inside a component are escaped, so distinct
/// component lists never produce the same key.
fn compose_key(parts: &[&str]) -> String {
    parts
        .iter()
        .map(|p| p.replace('\\', "\\\\").replace('|', "\\|"))
        .collect::<Vec<_>>()
        .join("|")
}

fn port_part(port: Option<i64>) -> String {
    port.map(|p| p.to_string()).unwrap_or_default()
}

fn lowercase(value: &mut Option<String>) {
    if let Some(v) = value {
        *v = v.to_ascii_lowercase();
    }
}

/// Local filesystem: one provider per owner
pub struct LocalStrategy;

impl ProviderStrategy for LocalStrategy {
    fn normalize(&self, fields: &mut ConnectionFields) {
        *fields = ConnectionFields::default();
    }

    fn build_key(&self, provider_type: &ProviderType, _fields: &ConnectionFields, owner_id: i64) -> String {
        compose_key(&[provider_type.as_str(), format!("owner:{}", owner_id).as_str()])
    }

    fn identity(&self, _fields: &ConnectionFields, owner_id: i64) -> String {
        format!("owner {}", owner_id)
    }
}

/// Host based protocols (SFTP, FTP)
pub struct HostStrategy {
    default_port: u16,
}

impl HostStrategy {
    pub fn new(default_port: u16) -> Self {
        Self { default_port }
    }
}

impl ProviderStrategy for HostStrategy {
    fn normalize(&self, fields: &mut ConnectionFields) {
        lowercase(&mut fields.host);
        if fields.port.is_none_or(|p| p == 0) {
            fields.port = Some(i64::from(self.default_port));
        }
    }

    fn build_key(&self, provider_type: &ProviderType, fields: &ConnectionFields, _owner_id: i64) -> String {
        compose_key(&[
            provider_type.as_str(),
            part(fields.text(ConnectionField::Host)),
            port_part(fields.port).as_str(),
            part(fields.text(ConnectionField::Username)),
            part(fields.text(ConnectionField::KeyFile)),
        ])
    }

    fn identity(&self, fields: &ConnectionFields, _owner_id: i64) -> String {
        let host = fields.text(ConnectionField::Host).unwrap_or("unknown");
        let address = match fields.port {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };
        match fields.text(ConnectionField::Username) {
            Some(user) => format!("{}@{}", user, address),
            None => address,
        }
    }

    fn placeholder(&self, field: ConnectionField) -> Option<&'static str> {
        match field {
            ConnectionField::Host => Some(PLACEHOLDER_HOST),
            ConnectionField::Username => Some(PLACEHOLDER_USERNAME),
            _ => None,
        }
    }
}

/// S3-compatible object storage
pub struct ObjectStorageStrategy;

impl ProviderStrategy for ObjectStorageStrategy {
    fn normalize(&self, fields: &mut ConnectionFields) {
        lowercase(&mut fields.endpoint);
        lowercase(&mut fields.region);
        if let Some(endpoint) = fields.endpoint.as_mut() {
            let trimmed = endpoint.trim_end_matches('/').len();
            endpoint.truncate(trimmed);
        }
        if fields.endpoint.as_deref() == Some("") {
            fields.endpoint = None;
        }
    }

    fn build_key(&self, provider_type: &ProviderType, fields: &ConnectionFields, _owner_id: i64) -> String {
        compose_key(&[
            provider_type.as_str(),
            part(fields.text(ConnectionField::Endpoint)),
            part(fields.text(ConnectionField::Region)),
            part(fields.text(ConnectionField::AccessKey)),
        ])
    }

    fn identity(&self, fields: &ConnectionFields, _owner_id: i64) -> String {
        format!(
            "{}/{}",
            fields.text(ConnectionField::Endpoint).unwrap_or("aws"),
            fields.text(ConnectionField::Region).unwrap_or("default")
        )
    }

    fn placeholder(&self, field: ConnectionField) -> Option<&'static str> {
        match field {
            ConnectionField::Region => Some(PLACEHOLDER_REGION),
            ConnectionField::AccessKey => Some(PLACEHOLDER_ACCESS_KEY),
            _ => None,
        }
    }
}

/// SMB shares
pub struct ShareStrategy;

impl ProviderStrategy for ShareStrategy {
    fn normalize(&self, fields: &mut ConnectionFields) {
        lowercase(&mut fields.host);
        if let Some(share) = fields.share.take() {
            let share = share.trim_matches(|c| c == '/' || c == '\\').to_string();
            fields.share = (!share.is_empty()).then_some(share);
        }
    }

    fn build_key(&self, provider_type: &ProviderType, fields: &ConnectionFields, _owner_id: i64) -> String {
        compose_key(&[
            provider_type.as_str(),
            part(fields.text(ConnectionField::Host)),
            part(fields.text(ConnectionField::Share)),
            part(fields.text(ConnectionField::Username)),
        ])
    }

    fn identity(&self, fields: &ConnectionFields, _owner_id: i64) -> String {
        format!(
            "//{}/{}",
            fields.text(ConnectionField::Host).unwrap_or("unknown"),
            fields.text(ConnectionField::Share).unwrap_or("")
        )
    }

    fn placeholder(&self, field: ConnectionField) -> Option<&'static str> {
        match field {
            ConnectionField::Host => Some(PLACEHOLDER_HOST),
            ConnectionField::Share => Some(PLACEHOLDER_SHARE),
            _ => None,
        }
    }
}

/// OAuth backed drives (OneDrive, Google Drive, Google Photos)
pub struct OAuthStrategy;

impl ProviderStrategy for OAuthStrategy {
    fn build_key(&self, provider_type: &ProviderType, fields: &ConnectionFields, _owner_id: i64) -> String {
        compose_key(&[
            provider_type.as_str(),
            part(fields.text(ConnectionField::ClientId)),
            part(fields.text(ConnectionField::DriveId)),
        ])
    }

    fn identity(&self, fields: &ConnectionFields, _owner_id: i64) -> String {
        fields
            .text(ConnectionField::DriveId)
            .or_else(|| fields.text(ConnectionField::ClientId))
            .unwrap_or("default")
            .to_string()
    }
}

/// Unknown types: identify by host, port and username
pub struct FallbackStrategy;

impl ProviderStrategy for FallbackStrategy {
    fn normalize(&self, fields: &mut ConnectionFields) {
        lowercase(&mut fields.host);
    }

    fn build_key(&self, provider_type: &ProviderType, fields: &ConnectionFields, _owner_id: i64) -> String {
        compose_key(&[
            provider_type.as_str(),
            part(fields.text(ConnectionField::Host)),
            port_part(fields.port).as_str(),
            part(fields.text(ConnectionField::Username)),
        ])
    }

    fn identity(&self, fields: &ConnectionFields, _owner_id: i64) -> String {
        fields.text(ConnectionField::Host).unwrap_or("unknown").to_string()
    }

    fn placeholder(&self, field: ConnectionField) -> Option<&'static str> {
        match field {
            ConnectionField::Host => Some(PLACEHOLDER_HOST),
            _ => None,
        }
    }
}

/// Strategy lookup keyed by provider type tag
#[derive(Clone)]
pub struct StrategyRegistry {
    strategies: HashMap<String, Arc<dyn ProviderStrategy>>,
    fallback: Arc<dyn ProviderStrategy>,
}

impl StrategyRegistry {
    /// Registry with no type-specific strategies
    pub fn empty() -> Self {
        Self {
            strategies: HashMap::new(),
            fallback: Arc::new(FallbackStrategy),
        }
    }

    /// Register (or replace) the strategy for a type
    pub fn register(&mut self, provider_type: ProviderType, strategy: Arc<dyn ProviderStrategy>) {
        self.strategies
            .insert(provider_type.as_str().to_string(), strategy);
    }

    /// Strategy for a type; unknown tags get the fallback
    pub fn get(&self, provider_type: &ProviderType) -> &dyn ProviderStrategy {
        self.strategies
            .get(provider_type.as_str())
            .map(|s| s.as_ref())
            .unwrap_or(self.fallback.as_ref())
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        let oauth: Arc<dyn ProviderStrategy> = Arc::new(OAuthStrategy);

        registry.register(ProviderType::Local, Arc::new(LocalStrategy));
        registry.register(ProviderType::Sftp, Arc::new(HostStrategy::new(22)));
        registry.register(ProviderType::Ftp, Arc::new(HostStrategy::new(21)));
        registry.register(ProviderType::S3, Arc::new(ObjectStorageStrategy));
        registry.register(ProviderType::Smb, Arc::new(ShareStrategy));
        registry.register(ProviderType::OneDrive, Arc::clone(&oauth));
        registry.register(ProviderType::GoogleDrive, Arc::clone(&oauth));
        registry.register(ProviderType::GooglePhotos, oauth);
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(provider_type: ProviderType, fields: &ConnectionFields, owner_id: i64) -> String {
        let registry = StrategyRegistry::default();
        let mut fields = fields.clone();
        registry.get(&provider_type).normalize(&mut fields);
        registry.get(&provider_type).build_key(&provider_type, &fields, owner_id)
    }

    #[test]
    fn test_host_key_ignores_password() {
        let a = ConnectionFields {
            host: Some("Files.Example.com".into()),
            username: Some("backup".into()),
            password: Some("one".into()),
            ..Default::default()
        };
        let b = ConnectionFields {
            host: Some("files.example.com".into()),
            port: Some(22),
            username: Some("backup".into()),
            password: Some("two".into()),
            ..Default::default()
        };

        assert_eq!(key(ProviderType::Sftp, &a, 1), key(ProviderType::Sftp, &b, 2));
        assert_eq!(key(ProviderType::Sftp, &a, 1), "sftp|files.example.com|22|backup|");
    }

    #[test]
    fn test_key_file_distinguishes_host_credentials() {
        let a = ConnectionFields {
            host: Some("h".into()),
            username: Some("u".into()),
            key_file: Some("/keys/a".into()),
            ..Default::default()
        };
        let mut b = a.clone();
        b.key_file = Some("/keys/b".into());

        assert_ne!(key(ProviderType::Sftp, &a, 1), key(ProviderType::Sftp, &b, 1));
    }

    #[test]
    fn test_separator_inside_field_does_not_collide() {
        let a = ConnectionFields {
            host: Some("h".into()),
            username: Some("u|k".into()),
            ..Default::default()
        };
        let b = ConnectionFields {
            host: Some("h".into()),
            username: Some("u".into()),
            key_file: Some("k|".into()),
            ..Default::default()
        };
        assert_ne!(key(ProviderType::Sftp, &a, 1), key(ProviderType::Sftp, &b, 1));
        assert_eq!(key(ProviderType::Sftp, &a, 1), "sftp|h|22|u\\|k|");

        let c = ConnectionFields {
            host: Some("h\\".into()),
            username: Some("u".into()),
            ..Default::default()
        };
        let d = ConnectionFields {
            host: Some("h\\|u".into()),
            ..Default::default()
        };
        assert_ne!(key(ProviderType::Sftp, &c, 1), key(ProviderType::Sftp, &d, 1));
    }

    #[test]
    fn test_keys_are_type_specific() {
        let fields = ConnectionFields {
            host: Some("h".into()),
            username: Some("u".into()),
            ..Default::default()
        };
        assert_ne!(key(ProviderType::Sftp, &fields, 1), key(ProviderType::Ftp, &fields, 1));
        assert_ne!(
            key(ProviderType::Smb, &fields, 1),
            key(ProviderType::Other("webdav".into()), &fields, 1)
        );
    }

    #[test]
    fn test_object_storage_key() {
        let fields = ConnectionFields {
            endpoint: Some("https://S3.example.com/".into()),
            region: Some("EU-West-1".into()),
            access_key: Some("AKIA1".into()),
            secret_key: Some("ignored".into()),
            ..Default::default()
        };
        assert_eq!(
            key(ProviderType::S3, &fields, 1),
            "s3|https://s3.example.com|eu-west-1|AKIA1"
        );
    }

    #[test]
    fn test_share_and_oauth_keys() {
        let share = ConnectionFields {
            host: Some("NAS".into()),
            share: Some("/backups/".into()),
            username: Some("u".into()),
            ..Default::default()
        };
        assert_eq!(key(ProviderType::Smb, &share, 1), "smb|nas|backups|u");

        let oauth = ConnectionFields {
            client_id: Some("client".into()),
            drive_id: Some("drive-1".into()),
            client_secret: Some("ignored".into()),
            ..Default::default()
        };
        assert_eq!(key(ProviderType::OneDrive, &oauth, 1), "onedrive|client|drive-1");
        assert_ne!(
            key(ProviderType::OneDrive, &oauth, 1),
            key(ProviderType::GoogleDrive, &oauth, 1)
        );
    }

    #[test]
    fn test_local_key_is_per_owner() {
        let fields = ConnectionFields {
            host: Some("ignored".into()),
            ..Default::default()
        };
        assert_eq!(key(ProviderType::Local, &fields, 5), "local|owner:5");
        assert_ne!(key(ProviderType::Local, &fields, 5), key(ProviderType::Local, &fields, 6));
    }

    #[test]
    fn test_unknown_type_uses_fallback() {
        let fields = ConnectionFields {
            host: Some("DAV.example.com".into()),
            port: Some(443),
            username: Some("u".into()),
            ..Default::default()
        };
        assert_eq!(
            key(ProviderType::Other("webdav".into()), &fields, 1),
            "webdav|dav.example.com|443|u"
        );
    }

    #[test]
    fn test_auto_fill_uses_type_placeholders() {
        let registry = StrategyRegistry::default();

        let mut s3 = ConnectionFields::default();
        let filled = registry
            .get(&ProviderType::S3)
            .auto_fill_defaults(&ProviderType::S3, &mut s3);
        assert_eq!(filled, vec![ConnectionField::Region, ConnectionField::AccessKey]);
        assert_eq!(s3.region.as_deref(), Some(PLACEHOLDER_REGION));

        let mut sftp = ConnectionFields {
            username: Some("kept".into()),
            ..Default::default()
        };
        let filled = registry
            .get(&ProviderType::Sftp)
            .auto_fill_defaults(&ProviderType::Sftp, &mut sftp);
        assert_eq!(filled, vec![ConnectionField::Host]);
        assert_eq!(sftp.host.as_deref(), Some(PLACEHOLDER_HOST));
        assert_eq!(sftp.username.as_deref(), Some("kept"));
    }
}
