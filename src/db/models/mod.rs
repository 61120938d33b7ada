// src/db/models/mod.rs

//! Data models for transfer database entities
//!
//! This module defines Rust structs that correspond to database tables
//! and provides methods for creating, reading, updating, and deleting records.

mod connection;
mod storage_provider;
mod transfer_config;

pub use connection::{
    ConnectionField, ConnectionFields, ProviderFamily, ProviderType, SECRET_FIELDS,
};
pub use storage_provider::StorageProvider;
pub use transfer_config::{Direction, Endpoint, TransferConfig};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    #[test]
    fn test_config_references_provider() {
        let conn = db::open_in_memory().unwrap();

        let mut provider = StorageProvider::new("nas".into(), ProviderType::Smb, 1);
        provider.connection.host = Some("nas.local".into());
        provider.connection.share = Some("backups".into());
        let provider_id = provider.insert(&conn).unwrap();

        let mut source = Endpoint::new(ProviderType::Smb);
        source.provider_id = Some(provider_id);
        let mut config =
            TransferConfig::new("to-nas".into(), 1, source, Endpoint::new(ProviderType::Local));
        let config_id = config.insert(&conn).unwrap();

        assert_eq!(StorageProvider::reference_count(&conn, provider_id).unwrap(), 1);

        TransferConfig::set_provider_ref(&conn, config_id, Direction::Destination, Some(provider_id))
            .unwrap();
        let found = TransferConfig::find_by_id(&conn, config_id).unwrap().unwrap();
        assert!(found.is_fully_migrated());
    }
}
