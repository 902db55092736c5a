//! Inventory Sync Library
//!
//! Reads backup job history from the backup catalog and records per-host
//! backup summaries in the machine inventory.

pub mod config;
pub mod inventory;
pub mod pipeline;
pub mod summary;
pub mod utils;

// Re-export commonly used types
pub use crate::config::Config;
pub use pipeline::{Pipeline, PipelineOptions, SyncReport};
pub use utils::errors::{Result, SyncError};
