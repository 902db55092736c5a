//! Error types for the inventory sync.

use backup_catalog::{BackupLevel, CatalogError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("Failed to read {level} jobs of client {client}: {source}")]
    JobHistory {
        client: String,
        level: BackupLevel,
        #[source]
        source: CatalogError,
    },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Inventory API returned {status} for {url}: {body}")]
    Api { status: u16, url: String, body: String },

    #[error("Failed to {action} machine {fqdn}: {source}")]
    Reconcile {
        fqdn: String,
        action: &'static str,
        #[source]
        source: Box<SyncError>,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SyncError {
    pub fn reconcile(fqdn: &str, action: &'static str, source: SyncError) -> Self {
        SyncError::Reconcile {
            fqdn: fqdn.to_string(),
            action,
            source: Box::new(source),
        }
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
