//! In-memory catalog and inventory used by the pipeline tests.

use crate::inventory::{Inventory, Machine};
use crate::utils::errors::{Result, SyncError};
use async_trait::async_trait;
use backup_catalog::{BackupJob, BackupLevel, CatalogError, CatalogStore, Client, RowSet};
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

pub fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

pub fn client(id: i64, name: &str) -> Client {
    Client {
        id,
        name: name.to_string(),
    }
}

pub fn job(level: BackupLevel, completed_at: NaiveDateTime, bytes: u64) -> BackupJob {
    BackupJob {
        level,
        completed_at,
        bytes,
    }
}

enum Listing {
    Rows(Vec<std::result::Result<Client, String>>),
    QueryFailed(String),
}

/// Catalog whose rows and failures are scripted per test.
pub struct FakeCatalog {
    clients: Listing,
    jobs: HashMap<(i64, BackupLevel), Vec<BackupJob>>,
    failing: HashSet<(i64, BackupLevel)>,
    pub queries: Mutex<Vec<(i64, BackupLevel)>>,
}

impl FakeCatalog {
    pub fn new(clients: Vec<Client>) -> Self {
        Self {
            clients: Listing::Rows(clients.into_iter().map(Ok).collect()),
            jobs: HashMap::new(),
            failing: HashSet::new(),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_listing(message: &str) -> Self {
        Self {
            clients: Listing::QueryFailed(message.to_string()),
            ..Self::new(Vec::new())
        }
    }

    pub fn with_bad_client_row(mut self, message: &str) -> Self {
        if let Listing::Rows(rows) = &mut self.clients {
            rows.push(Err(message.to_string()));
        }
        self
    }

    pub fn with_jobs(mut self, client_id: i64, level: BackupLevel, jobs: Vec<BackupJob>) -> Self {
        self.jobs.insert((client_id, level), jobs);
        self
    }

    pub fn with_failing_level(mut self, client_id: i64, level: BackupLevel) -> Self {
        self.failing.insert((client_id, level));
        self
    }
}

#[async_trait]
impl CatalogStore for FakeCatalog {
    async fn list_clients(&self) -> std::result::Result<RowSet<Client>, CatalogError> {
        match &self.clients {
            Listing::QueryFailed(message) => Err(CatalogError::Query(message.clone())),
            Listing::Rows(rows) => Ok(RowSet::collect(rows.iter().map(|r| match r {
                Ok(c) => Ok(c.clone()),
                Err(message) => Err(CatalogError::Decode {
                    table: "Client",
                    message: message.clone(),
                }),
            }))),
        }
    }

    async fn level_jobs(
        &self,
        level: BackupLevel,
        client: &Client,
    ) -> std::result::Result<RowSet<BackupJob>, CatalogError> {
        self.queries.lock().unwrap().push((client.id, level));
        if self.failing.contains(&(client.id, level)) {
            return Err(CatalogError::Query(format!("{} jobs unavailable", level)));
        }
        let jobs = self.jobs.get(&(client.id, level)).cloned().unwrap_or_default();
        Ok(RowSet::collect(jobs.into_iter().map(Ok)))
    }

    async fn close(&self) {}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Find(String),
    Create(Machine),
    Update(String, Machine),
}

/// Inventory holding a fixed set of known machines.
#[derive(Default)]
pub struct FakeInventory {
    known: HashSet<String>,
    broken_lookups: HashSet<String>,
    rejected_writes: HashSet<String>,
    pub calls: Mutex<Vec<Call>>,
}

impl FakeInventory {
    pub fn new(known: &[&str]) -> Self {
        Self {
            known: known.iter().map(|s| s.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn with_broken_lookup(mut self, fqdn: &str) -> Self {
        self.broken_lookups.insert(fqdn.to_string());
        self
    }

    pub fn with_rejected_write(mut self, fqdn: &str) -> Self {
        self.rejected_writes.insert(fqdn.to_string());
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn writes(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| !matches!(c, Call::Find(_)))
            .collect()
    }

    fn reject(&self, fqdn: &str) -> Result<()> {
        if self.rejected_writes.contains(fqdn) {
            return Err(SyncError::Api {
                status: 422,
                url: format!("/api/v3/machines/{}", fqdn),
                body: "rejected".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl Inventory for FakeInventory {
    async fn find_machine(&self, fqdn: &str) -> Result<Option<Machine>> {
        self.calls.lock().unwrap().push(Call::Find(fqdn.to_string()));
        if self.broken_lookups.contains(fqdn) {
            return Err(SyncError::Api {
                status: 500,
                url: format!("/api/v3/machines/{}", fqdn),
                body: "internal error".to_string(),
            });
        }
        Ok(self.known.contains(fqdn).then(|| Machine {
            fqdn: fqdn.to_string(),
            ..Machine::default()
        }))
    }

    async fn create_machine(&self, machine: &Machine) -> Result<()> {
        self.calls.lock().unwrap().push(Call::Create(machine.clone()));
        self.reject(&machine.fqdn)
    }

    async fn update_machine(&self, fqdn: &str, machine: &Machine) -> Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push(Call::Update(fqdn.to_string(), machine.clone()));
        self.reject(fqdn)
    }
}
