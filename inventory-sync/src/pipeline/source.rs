//! Client source: lists the catalog's clients into the pipeline.

use super::sink::{report, ErrorSender};
use backup_catalog::{CatalogStore, Client, RowSet};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Send every decodable client downstream. A failed listing query closes the
/// stream empty; undecodable rows are skipped and the last such error is
/// reported once. Returns the number of clients sent.
pub async fn run(
    store: Arc<dyn CatalogStore>,
    clients: mpsc::Sender<Client>,
    errors: ErrorSender,
) -> usize {
    let RowSet { items, last_error } = match store.list_clients().await {
        Ok(set) => set,
        Err(e) => {
            report(&errors, e.into());
            return 0;
        }
    };

    if let Some(e) = last_error {
        report(&errors, e.into());
    }

    let mut sent = 0;
    for client in items {
        if clients.send(client).await.is_err() {
            warn!("Aggregator stopped, dropping remaining clients");
            break;
        }
        sent += 1;
    }

    info!(count = sent, "Clients listed");
    sent
}
