//! Backup Catalog
//!
//! Read-only access to the backup catalog database: the registered clients
//! and the history of successfully completed backup jobs per level.

pub mod error;
pub mod models;
pub mod rows;
pub mod store;

// Re-export commonly used types
pub use error::CatalogError;
pub use models::{BackupJob, BackupLevel, Client};
pub use rows::RowSet;
pub use store::{connect, CatalogStore};
pub type Result<T> = std::result::Result<T, CatalogError>;
