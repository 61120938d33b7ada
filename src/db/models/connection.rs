// src/db/models/connection.rs

//! Connection fields shared by transfer configurations and storage providers
//!
//! A transfer configuration stores one set of these columns per side
//! (prefixed `source_` / `dest_`); a storage provider stores exactly one set
//! without a prefix. Keeping the column list in one place lets both models
//! read and write the same shape.

use rusqlite::Row;
use rusqlite::types::ToSql;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Storage backend type of one side of a transfer
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ProviderType {
    Local,
    Sftp,
    Ftp,
    S3,
    Smb,
    OneDrive,
    GoogleDrive,
    GooglePhotos,
    /// Unrecognized type tag, kept verbatim
    Other(String),
}

/// Groups of provider types that share identifying fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderFamily {
    Local,
    Host,
    ObjectStorage,
    Share,
    OAuth,
    Other,
}

impl ProviderType {
    pub fn as_str(&self) -> &str {
        match self {
            ProviderType::Local => "local",
            ProviderType::Sftp => "sftp",
            ProviderType::Ftp => "ftp",
            ProviderType::S3 => "s3",
            ProviderType::Smb => "smb",
            ProviderType::OneDrive => "onedrive",
            ProviderType::GoogleDrive => "gdrive",
            ProviderType::GooglePhotos => "gphotos",
            ProviderType::Other(tag) => tag,
        }
    }

    /// Parse a type tag; matching is case-insensitive and never fails
    ///
    /// Unknown tags are kept lowercased so that spellings differing only in
    /// case name the same type.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" | "" => ProviderType::Local,
            "sftp" => ProviderType::Sftp,
            "ftp" => ProviderType::Ftp,
            "s3" => ProviderType::S3,
            "smb" => ProviderType::Smb,
            "onedrive" => ProviderType::OneDrive,
            "gdrive" | "drive" => ProviderType::GoogleDrive,
            "gphotos" | "googlephotos" => ProviderType::GooglePhotos,
            other => ProviderType::Other(other.to_string()),
        }
    }

    pub fn family(&self) -> ProviderFamily {
        match self {
            ProviderType::Local => ProviderFamily::Local,
            ProviderType::Sftp | ProviderType::Ftp => ProviderFamily::Host,
            ProviderType::S3 => ProviderFamily::ObjectStorage,
            ProviderType::Smb => ProviderFamily::Share,
            ProviderType::OneDrive | ProviderType::GoogleDrive | ProviderType::GooglePhotos => {
                ProviderFamily::OAuth
            }
            ProviderType::Other(_) => ProviderFamily::Other,
        }
    }

    /// Local storage has no remote identity and carries no credentials
    pub fn is_local(&self) -> bool {
        matches!(self, ProviderType::Local)
    }

    /// Fields a provider row of this type must carry
    pub fn required_fields(&self) -> &'static [ConnectionField] {
        match self.family() {
            ProviderFamily::Host => &[ConnectionField::Host, ConnectionField::Username],
            ProviderFamily::ObjectStorage => &[ConnectionField::Region, ConnectionField::AccessKey],
            ProviderFamily::Share => &[ConnectionField::Host, ConnectionField::Share],
            ProviderFamily::Other => &[ConnectionField::Host],
            ProviderFamily::OAuth | ProviderFamily::Local => &[],
        }
    }
}

impl fmt::Display for ProviderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<String> for ProviderType {
    fn from(s: String) -> Self {
        ProviderType::parse(&s)
    }
}

impl From<ProviderType> for String {
    fn from(t: ProviderType) -> Self {
        t.as_str().to_string()
    }
}

/// Text-valued connection columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ConnectionField {
    Host,
    Username,
    Password,
    KeyFile,
    Endpoint,
    Region,
    AccessKey,
    SecretKey,
    Share,
    Domain,
    ClientId,
    ClientSecret,
    DriveId,
    Token,
}

/// Fields that hold secrets and are encrypted at rest on provider rows
pub const SECRET_FIELDS: [ConnectionField; 4] = [
    ConnectionField::Password,
    ConnectionField::SecretKey,
    ConnectionField::ClientSecret,
    ConnectionField::Token,
];

impl ConnectionField {
    pub const ALL: [ConnectionField; 14] = [
        ConnectionField::Host,
        ConnectionField::Username,
        ConnectionField::Password,
        ConnectionField::KeyFile,
        ConnectionField::Endpoint,
        ConnectionField::Region,
        ConnectionField::AccessKey,
        ConnectionField::SecretKey,
        ConnectionField::Share,
        ConnectionField::Domain,
        ConnectionField::ClientId,
        ConnectionField::ClientSecret,
        ConnectionField::DriveId,
        ConnectionField::Token,
    ];

    /// Column name without side prefix
    pub fn column(&self) -> &'static str {
        match self {
            ConnectionField::Host => "host",
            ConnectionField::Username => "username",
            ConnectionField::Password => "password",
            ConnectionField::KeyFile => "key_file",
            ConnectionField::Endpoint => "endpoint",
            ConnectionField::Region => "region",
            ConnectionField::AccessKey => "access_key",
            ConnectionField::SecretKey => "secret_key",
            ConnectionField::Share => "share",
            ConnectionField::Domain => "domain",
            ConnectionField::ClientId => "client_id",
            ConnectionField::ClientSecret => "client_secret",
            ConnectionField::DriveId => "drive_id",
            ConnectionField::Token => "token",
        }
    }

    pub fn is_secret(&self) -> bool {
        SECRET_FIELDS.contains(self)
    }
}

impl fmt::Display for ConnectionField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.column())
    }
}

/// Connection details for one storage endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionFields {
    pub host: Option<String>,
    /// Stored as read; legacy rows may hold values outside the TCP range
    pub port: Option<i64>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub key_file: Option<String>,
    pub endpoint: Option<String>,
    pub region: Option<String>,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    pub share: Option<String>,
    pub domain: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub drive_id: Option<String>,
    pub token: Option<String>,
    pub authenticated: bool,
}

impl ConnectionFields {
    /// Column names in the order `sql_values` binds them
    pub fn columns(prefix: &str) -> Vec<String> {
        let mut columns: Vec<String> = ConnectionField::ALL
            .iter()
            .map(|field| format!("{}{}", prefix, field.column()))
            .collect();
        columns.push(format!("{}port", prefix));
        columns.push(format!("{}authenticated", prefix));
        columns
    }

    /// Bind values matching `columns`
    pub fn sql_values(&self) -> Vec<&dyn ToSql> {
        let mut values: Vec<&dyn ToSql> = ConnectionField::ALL
            .iter()
            .map(|field| self.slot(*field) as &dyn ToSql)
            .collect();
        values.push(&self.port);
        values.push(&self.authenticated);
        values
    }

    /// Read the prefixed connection columns from a row
    pub fn from_row(row: &Row, prefix: &str) -> rusqlite::Result<Self> {
        let mut fields = ConnectionFields {
            port: row.get(format!("{}port", prefix).as_str())?,
            authenticated: row.get(format!("{}authenticated", prefix).as_str())?,
            ..Default::default()
        };
        for field in ConnectionField::ALL {
            *fields.text_mut(field) = row.get(format!("{}{}", prefix, field.column()).as_str())?;
        }
        Ok(fields)
    }

    fn slot(&self, field: ConnectionField) -> &Option<String> {
        match field {
            ConnectionField::Host => &self.host,
            ConnectionField::Username => &self.username,
            ConnectionField::Password => &self.password,
            ConnectionField::KeyFile => &self.key_file,
            ConnectionField::Endpoint => &self.endpoint,
            ConnectionField::Region => &self.region,
            ConnectionField::AccessKey => &self.access_key,
            ConnectionField::SecretKey => &self.secret_key,
            ConnectionField::Share => &self.share,
            ConnectionField::Domain => &self.domain,
            ConnectionField::ClientId => &self.client_id,
            ConnectionField::ClientSecret => &self.client_secret,
            ConnectionField::DriveId => &self.drive_id,
            ConnectionField::Token => &self.token,
        }
    }

    /// Value of a text field, `None` when unset or empty
    pub fn text(&self, field: ConnectionField) -> Option<&str> {
        self.slot(field).as_deref().filter(|v| !v.is_empty())
    }

    pub fn text_mut(&mut self, field: ConnectionField) -> &mut Option<String> {
        match field {
            ConnectionField::Host => &mut self.host,
            ConnectionField::Username => &mut self.username,
            ConnectionField::Password => &mut self.password,
            ConnectionField::KeyFile => &mut self.key_file,
            ConnectionField::Endpoint => &mut self.endpoint,
            ConnectionField::Region => &mut self.region,
            ConnectionField::AccessKey => &mut self.access_key,
            ConnectionField::SecretKey => &mut self.secret_key,
            ConnectionField::Share => &mut self.share,
            ConnectionField::Domain => &mut self.domain,
            ConnectionField::ClientId => &mut self.client_id,
            ConnectionField::ClientSecret => &mut self.client_secret,
            ConnectionField::DriveId => &mut self.drive_id,
            ConnectionField::Token => &mut self.token,
        }
    }

    /// Secret fields that currently hold a value
    pub fn present_secrets(&self) -> impl Iterator<Item = (ConnectionField, &str)> + '_ {
        SECRET_FIELDS
            .iter()
            .filter_map(|field| self.text(*field).map(|value| (*field, value)))
    }

    /// Port value that cannot be a TCP port, if one is set
    pub fn invalid_port(&self) -> Option<i64> {
        self.port.filter(|p| u16::try_from(*p).is_err())
    }

    /// True when no connection column is set
    pub fn is_empty(&self) -> bool {
        self.port.is_none()
            && !self.authenticated
            && ConnectionField::ALL.iter().all(|f| self.text(*f).is_none())
    }
}
