//! Inventory reconciler: upserts each summary into the inventory.
//!
//! | lookup    | create_missing | action          |
//! |-----------|----------------|-----------------|
//! | found     | any            | update          |
//! | not found | true           | create          |
//! | not found | false          | skip (no write) |

use super::sink::{report, ErrorSender};
use crate::inventory::{Inventory, Machine};
use crate::summary::BackupSummary;
use crate::utils::errors::{Result, SyncError};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Created,
    Updated,
    Skipped,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileStats {
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
}

impl ReconcileStats {
    fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Created => self.created += 1,
            Outcome::Updated => self.updated += 1,
            Outcome::Skipped => self.skipped += 1,
        }
    }
}

/// Reconcile summaries in arrival order. Failures are reported and the next
/// summary is processed; nothing is retried.
pub async fn run(
    inventory: Arc<dyn Inventory>,
    mut summaries: mpsc::Receiver<BackupSummary>,
    errors: ErrorSender,
    create_missing: bool,
) -> ReconcileStats {
    let mut stats = ReconcileStats::default();

    while let Some(summary) = summaries.recv().await {
        match reconcile(inventory.as_ref(), &summary, create_missing).await {
            Ok(outcome) => {
                debug!(fqdn = %summary.fqdn, ?outcome, "Machine reconciled");
                stats.record(outcome);
            }
            Err(e) => report(&errors, e),
        }
    }

    info!(
        created = stats.created,
        updated = stats.updated,
        skipped = stats.skipped,
        "Inventory reconciliation complete"
    );
    stats
}

/// The lookup only decides between create and update; its payload is ignored.
pub async fn reconcile(
    inventory: &dyn Inventory,
    summary: &BackupSummary,
    create_missing: bool,
) -> Result<Outcome> {
    let fqdn = summary.fqdn.as_str();
    let exists = inventory
        .find_machine(fqdn)
        .await
        .map_err(|e| SyncError::reconcile(fqdn, "look up", e))?
        .is_some();

    let machine = Machine::from_summary(summary);
    match (exists, create_missing) {
        (true, _) => {
            inventory
                .update_machine(fqdn, &machine)
                .await
                .map_err(|e| SyncError::reconcile(fqdn, "update", e))?;
            Ok(Outcome::Updated)
        }
        (false, true) => {
            inventory
                .create_machine(&machine)
                .await
                .map_err(|e| SyncError::reconcile(fqdn, "create", e))?;
            Ok(Outcome::Created)
        }
        (false, false) => Ok(Outcome::Skipped),
    }
}
