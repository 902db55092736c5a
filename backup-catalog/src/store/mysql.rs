use super::{CatalogStore, CLIENTS_SQL, LEVEL_JOBS_SQL};
use crate::error::CatalogError;
use crate::models::{BackupJob, BackupLevel, Client};
use crate::rows::RowSet;
use crate::Result;
use async_trait::async_trait;
use futures_util::TryStreamExt;
use sqlx::mysql::{MySqlPool, MySqlPoolOptions, MySqlRow};
use sqlx::Row;
use std::time::Duration;
use tracing::{debug, info};

/// Catalog stored in MySQL / MariaDB.
pub struct MysqlCatalog {
    pool: MySqlPool,
}

impl MysqlCatalog {
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = MySqlPoolOptions::new()
            .max_connections(2)
            .acquire_timeout(Duration::from_secs(30))
            .connect(url)
            .await
            .map_err(|e| CatalogError::Connection(e.to_string()))?;

        info!("Connected to MySQL catalog");
        Ok(Self { pool })
    }
}

/// Bacula declares `Client.Name` as TINYBLOB, which the server flags as
/// binary, so the name is read as raw bytes and validated here.
fn client_name(raw: Vec<u8>) -> Result<String> {
    String::from_utf8(raw).map_err(|e| CatalogError::decode("Client", e))
}

/// Signed byte counters below zero carry no size.
fn clamp_bytes(bytes: i64) -> u64 {
    u64::try_from(bytes).unwrap_or(0)
}

// Bacula declares its id and byte columns UNSIGNED, but hand-made schemas
// (and some MariaDB versions) report them signed.
fn get_int(row: &MySqlRow, column: &str) -> sqlx::Result<i64> {
    row.try_get::<i64, _>(column)
        .or_else(|_| row.try_get::<u32, _>(column).map(i64::from))
}

fn get_bytes(row: &MySqlRow, column: &str) -> sqlx::Result<u64> {
    row.try_get::<u64, _>(column)
        .or_else(|_| row.try_get::<i64, _>(column).map(clamp_bytes))
}

fn row_to_client(row: &MySqlRow) -> Result<Client> {
    let raw_name: Vec<u8> = row
        .try_get("Name")
        .map_err(|e| CatalogError::decode("Client", e))?;
    Ok(Client {
        id: get_int(row, "ClientId").map_err(|e| CatalogError::decode("Client", e))?,
        name: client_name(raw_name)?,
    })
}

fn row_to_job(row: &MySqlRow, level: BackupLevel) -> Result<BackupJob> {
    Ok(BackupJob {
        level,
        completed_at: row
            .try_get("RealEndTime")
            .map_err(|e| CatalogError::decode("Job", e))?,
        bytes: get_bytes(row, "JobBytes").map_err(|e| CatalogError::decode("Job", e))?,
    })
}

#[async_trait]
impl CatalogStore for MysqlCatalog {
    async fn list_clients(&self) -> Result<RowSet<Client>> {
        let mut rows = sqlx::query(CLIENTS_SQL).fetch(&self.pool);
        let mut set = RowSet::new();
        while let Some(row) = rows.try_next().await? {
            set.push_row(row_to_client(&row));
        }
        debug!(count = set.items.len(), "Listed clients");
        Ok(set)
    }

    async fn level_jobs(&self, level: BackupLevel, client: &Client) -> Result<RowSet<BackupJob>> {
        let mut rows = sqlx::query(LEVEL_JOBS_SQL)
            .bind(client.id)
            .bind(level.code())
            .fetch(&self.pool);
        let mut set = RowSet::new();
        while let Some(row) = rows.try_next().await? {
            set.push_row(row_to_job(&row, level));
        }
        Ok(set)
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
