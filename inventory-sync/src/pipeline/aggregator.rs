//! Job aggregator: turns each client into a backup summary.

use super::sink::{report, ErrorSender};
use crate::summary::BackupSummary;
use crate::utils::errors::{Result, SyncError};
use backup_catalog::{BackupJob, BackupLevel, CatalogStore, Client};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Summarize clients in arrival order. A client with any failed level query
/// gets no summary at all. Returns the number of summaries sent.
pub async fn run(
    store: Arc<dyn CatalogStore>,
    mut clients: mpsc::Receiver<Client>,
    summaries: mpsc::Sender<BackupSummary>,
    errors: ErrorSender,
) -> usize {
    let mut sent = 0;

    while let Some(client) = clients.recv().await {
        let summary = match summarize(store.as_ref(), &client).await {
            Ok(summary) => summary,
            Err(e) => {
                report(&errors, e);
                continue;
            }
        };

        debug!(
            client = %client.name,
            fqdn = %summary.fqdn,
            full = summary.full.is_some(),
            incremental = summary.incremental.is_some(),
            differential = summary.differential.is_some(),
            "Client summarized"
        );

        if summaries.send(summary).await.is_err() {
            warn!("Reconciler stopped, dropping remaining summaries");
            break;
        }
        sent += 1;
    }

    info!(count = sent, "Job aggregation complete");
    sent
}

/// Fetch the three levels one after another and reduce them.
pub async fn summarize(store: &dyn CatalogStore, client: &Client) -> Result<BackupSummary> {
    let incremental = level_jobs(store, BackupLevel::Incremental, client).await?;
    let differential = level_jobs(store, BackupLevel::Differential, client).await?;
    let full = level_jobs(store, BackupLevel::Full, client).await?;

    Ok(BackupSummary::new(client, &full, &incremental, &differential))
}

async fn level_jobs(
    store: &dyn CatalogStore,
    level: BackupLevel,
    client: &Client,
) -> Result<Vec<BackupJob>> {
    store
        .level_jobs(level, client)
        .await
        .and_then(|set| set.into_complete())
        .map_err(|source| SyncError::JobHistory {
            client: client.name.clone(),
            level,
            source,
        })
}
