//! Synchronization pipeline.
//!
//! ```text
//!  catalog ──► source ──clients──► aggregator ──summaries──► reconciler ──► inventory
//!                │                     │                         │
//!                └─────────────────────┴────────errors───────────┴──► sink (log)
//! ```
//!
//! Each stage is its own task. The client and summary channels are bounded,
//! so a slow inventory throttles the aggregator, which throttles the source.
//! A stream ends when its sender is dropped; the sink stops once every stage
//! has dropped its error sender.

pub mod aggregator;
pub mod reconciler;
pub mod sink;
pub mod source;

#[cfg(test)]
pub(crate) mod testing;

use crate::config::Config;
use crate::inventory::Inventory;
use backup_catalog::CatalogStore;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinError;
use tracing::{error, info};

#[derive(Debug, Clone, Copy)]
pub struct PipelineOptions {
    pub create_missing: bool,
    pub channel_capacity: usize,
}

impl PipelineOptions {
    pub fn from_config(config: &Config) -> Self {
        PipelineOptions {
            create_missing: config.sync.create_missing,
            channel_capacity: config.pipeline.channel_capacity.max(1),
        }
    }
}

/// Totals of one synchronization pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SyncReport {
    pub clients: usize,
    pub summaries: usize,
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
    pub errors: usize,
}

impl SyncReport {
    pub fn is_clean(&self) -> bool {
        self.errors == 0
    }
}

pub struct Pipeline {
    store: Arc<dyn CatalogStore>,
    inventory: Arc<dyn Inventory>,
    options: PipelineOptions,
}

impl Pipeline {
    pub fn new(
        store: Arc<dyn CatalogStore>,
        inventory: Arc<dyn Inventory>,
        options: PipelineOptions,
    ) -> Self {
        Self {
            store,
            inventory,
            options,
        }
    }

    /// Run one full pass and wait for every stage to finish.
    pub async fn run(self) -> SyncReport {
        let (client_tx, client_rx) = mpsc::channel(self.options.channel_capacity);
        let (summary_tx, summary_rx) = mpsc::channel(self.options.channel_capacity);
        let (error_tx, error_rx) = mpsc::unbounded_channel();

        let sink = tokio::spawn(sink::drain(error_rx));
        let source = tokio::spawn(source::run(
            self.store.clone(),
            client_tx,
            error_tx.clone(),
        ));
        let aggregator = tokio::spawn(aggregator::run(
            self.store,
            client_rx,
            summary_tx,
            error_tx.clone(),
        ));
        let reconciler = tokio::spawn(reconciler::run(
            self.inventory,
            summary_rx,
            error_tx,
            self.options.create_missing,
        ));

        let (source, aggregator, reconciler) = tokio::join!(source, aggregator, reconciler);

        let mut crashed = 0;
        let clients = joined("client source", source, &mut crashed);
        let summaries = joined("job aggregator", aggregator, &mut crashed);
        let stats = joined("inventory reconciler", reconciler, &mut crashed);
        let errors = joined("error sink", sink.await, &mut crashed);

        let report = SyncReport {
            clients,
            summaries,
            created: stats.created,
            updated: stats.updated,
            skipped: stats.skipped,
            errors: errors + crashed,
        };

        info!(
            clients = report.clients,
            summaries = report.summaries,
            created = report.created,
            updated = report.updated,
            skipped = report.skipped,
            errors = report.errors,
            "Synchronization pass finished"
        );
        report
    }
}

fn joined<T: Default>(stage: &str, result: Result<T, JoinError>, crashed: &mut usize) -> T {
    result.unwrap_or_else(|e| {
        error!("{} task failed: {}", stage, e);
        *crashed += 1;
        T::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::Machine;
    use crate::pipeline::testing::{at, client, job, Call, FakeCatalog, FakeInventory};
    use backup_catalog::BackupLevel;

    fn options(create_missing: bool) -> PipelineOptions {
        PipelineOptions {
            create_missing,
            channel_capacity: 1,
        }
    }

    #[tokio::test]
    async fn test_end_to_end_create() {
        let store = Arc::new(
            FakeCatalog::new(vec![client(1, "a-fd")])
                .with_jobs(
                    1,
                    BackupLevel::Full,
                    vec![
                        job(BackupLevel::Full, at(2024, 1, 1), 100),
                        job(BackupLevel::Full, at(2024, 2, 1), 200),
                    ],
                )
                .with_jobs(
                    1,
                    BackupLevel::Differential,
                    vec![job(BackupLevel::Differential, at(2024, 2, 15), 10)],
                ),
        );
        let inventory = Arc::new(FakeInventory::new(&[]));

        let report = Pipeline::new(store, inventory.clone(), options(true)).run().await;

        assert!(report.is_clean());
        assert_eq!(report.clients, 1);
        assert_eq!(report.created, 1);
        assert_eq!(
            inventory.writes(),
            vec![Call::Create(Machine {
                fqdn: "a".to_string(),
                backup_brand: Some(1),
                backup_last_full_run: Some("2024-02-01 00:00:00".to_string()),
                backup_last_full_size: Some(300),
                backup_last_diff_run: Some("2024-02-15 00:00:00".to_string()),
                backup_last_diff_size: Some(10),
                ..Machine::default()
            })]
        );
    }

    #[tokio::test]
    async fn test_not_found_without_create_is_silent() {
        let store = Arc::new(FakeCatalog::new(vec![client(1, "a-fd"), client(2, "b-fd")]));
        let inventory = Arc::new(FakeInventory::new(&["b"]));

        let report = Pipeline::new(store, inventory.clone(), options(false)).run().await;

        assert!(report.is_clean());
        assert_eq!(report.skipped, 1);
        assert_eq!(report.updated, 1);
        assert_eq!(
            inventory.calls(),
            vec![
                Call::Find("a".to_string()),
                Call::Find("b".to_string()),
                Call::Update(
                    "b".to_string(),
                    Machine {
                        fqdn: "b".to_string(),
                        backup_brand: Some(1),
                        ..Machine::default()
                    }
                ),
            ]
        );
    }

    #[tokio::test]
    async fn test_failed_client_listing_runs_empty() {
        let store = Arc::new(FakeCatalog::failing_listing("connection lost"));
        let inventory = Arc::new(FakeInventory::new(&[]));

        let report = Pipeline::new(store, inventory.clone(), options(true)).run().await;

        assert_eq!(report, SyncReport { errors: 1, ..SyncReport::default() });
        assert!(inventory.calls().is_empty());
    }

    #[tokio::test]
    async fn test_undecodable_client_row_keeps_others() {
        let store = Arc::new(
            FakeCatalog::new(vec![client(1, "a-fd"), client(2, "b-fd")])
                .with_bad_client_row("Name is NULL"),
        );
        let inventory = Arc::new(FakeInventory::new(&[]));

        let report = Pipeline::new(store, inventory.clone(), options(true)).run().await;

        assert_eq!(report.clients, 2);
        assert_eq!(report.created, 2);
        assert_eq!(report.errors, 1);
        assert!(!report.is_clean());
    }

    #[tokio::test]
    async fn test_order_preserved_across_stages() {
        let names: Vec<String> = (0..20).map(|i| format!("host{:02}-fd", i)).collect();
        let clients = names
            .iter()
            .enumerate()
            .map(|(i, n)| client(i as i64, n))
            .collect();
        let store = Arc::new(FakeCatalog::new(clients).with_failing_level(5, BackupLevel::Full));
        let inventory = Arc::new(FakeInventory::new(&[]));

        let report = Pipeline::new(store, inventory.clone(), options(true)).run().await;

        assert_eq!(report.clients, 20);
        assert_eq!(report.summaries, 19);
        assert_eq!(report.errors, 1);

        let expected: Vec<Call> = (0..20)
            .filter(|i| *i != 5)
            .map(|i| Call::Find(format!("host{:02}", i)))
            .collect();
        let finds: Vec<Call> = inventory
            .calls()
            .into_iter()
            .filter(|c| matches!(c, Call::Find(_)))
            .collect();
        assert_eq!(finds, expected);
    }
}
