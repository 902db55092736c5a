//! Machine inventory access.

pub mod client;

use crate::summary::{BackupSummary, LevelStats};
use crate::utils::errors::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use client::IdbClient;

/// Format of run timestamps expected by the inventory.
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Backup fields of an inventory machine. Unset fields are left out of the
/// request body so an update never clears them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Machine {
    pub fqdn: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup_brand: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup_last_full_run: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup_last_full_size: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup_last_inc_run: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup_last_inc_size: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup_last_diff_run: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup_last_diff_size: Option<u64>,
}

fn split(stats: Option<LevelStats>) -> (Option<String>, Option<u64>) {
    match stats {
        Some(s) => (
            Some(s.last_run_at.format(TIME_FORMAT).to_string()),
            Some(s.total_bytes),
        ),
        None => (None, None),
    }
}

impl Machine {
    pub fn from_summary(summary: &BackupSummary) -> Self {
        let (backup_last_full_run, backup_last_full_size) = split(summary.full);
        let (backup_last_inc_run, backup_last_inc_size) = split(summary.incremental);
        let (backup_last_diff_run, backup_last_diff_size) = split(summary.differential);

        Machine {
            fqdn: summary.fqdn.clone(),
            backup_brand: Some(summary.backup_brand),
            backup_last_full_run,
            backup_last_full_size,
            backup_last_inc_run,
            backup_last_inc_size,
            backup_last_diff_run,
            backup_last_diff_size,
        }
    }
}

#[async_trait]
pub trait Inventory: Send + Sync {
    /// Look up a machine by FQDN. `Ok(None)` when the inventory doesn't know it.
    async fn find_machine(&self, fqdn: &str) -> Result<Option<Machine>>;

    async fn create_machine(&self, machine: &Machine) -> Result<()>;

    async fn update_machine(&self, fqdn: &str, machine: &Machine) -> Result<()>;
}
