//! Per-client backup summaries.

use backup_catalog::{BackupJob, Client};
use chrono::NaiveDateTime;

/// Backup brand identifying Bacula as the source of a machine's backup fields.
pub const BACKUP_BRAND_BACULA: i64 = 1;

/// Marker the file daemon appends to client names.
pub const AGENT_SUFFIX: &str = "-fd";

/// Derive the inventory FQDN from a raw client name.
pub fn normalize_fqdn(name: &str) -> &str {
    name.strip_suffix(AGENT_SUFFIX).unwrap_or(name)
}

/// Reduction of all completed jobs of one level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelStats {
    /// Completion time of the most recent job
    pub last_run_at: NaiveDateTime,
    /// Bytes transferred by every job of the level
    pub total_bytes: u64,
}

impl LevelStats {
    /// `None` if no job of the level ever completed. Expects jobs ordered by
    /// completion time, oldest first.
    pub fn from_jobs(jobs: &[BackupJob]) -> Option<Self> {
        let last = jobs.last()?;
        Some(LevelStats {
            last_run_at: last.completed_at,
            total_bytes: jobs
                .iter()
                .fold(0u64, |total, job| total.saturating_add(job.bytes)),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupSummary {
    pub fqdn: String,
    pub backup_brand: i64,
    pub full: Option<LevelStats>,
    pub incremental: Option<LevelStats>,
    pub differential: Option<LevelStats>,
}

impl BackupSummary {
    pub fn new(
        client: &Client,
        full: &[BackupJob],
        incremental: &[BackupJob],
        differential: &[BackupJob],
    ) -> Self {
        BackupSummary {
            fqdn: normalize_fqdn(&client.name).to_string(),
            backup_brand: BACKUP_BRAND_BACULA,
            full: LevelStats::from_jobs(full),
            incremental: LevelStats::from_jobs(incremental),
            differential: LevelStats::from_jobs(differential),
        }
    }
}
