//! Utility modules for the inventory sync.

pub mod errors;
pub mod logger;

pub use errors::{Result, SyncError};
