use super::{CatalogStore, CLIENTS_SQL, LEVEL_JOBS_SQL};
use crate::error::CatalogError;
use crate::Result;
use crate::models::{BackupJob, BackupLevel, Client};
use crate::rows::RowSet;
use async_trait::async_trait;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, OpenFlags, Row};
use tracing::{debug, info};

pub type DbPool = Pool<SqliteConnectionManager>;

/// Catalog stored in a SQLite file. Opened read-only.
pub struct SqliteCatalog {
    db: DbPool,
}

impl SqliteCatalog {
    /// Open the catalog file. Blocking; call from a blocking context.
    pub fn open(path: &str) -> Result<Self> {
        let flags = OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX;

        // Check with a plain connection first: r2d2 keeps retrying a broken
        // manager until its connection timeout expires.
        let check = rusqlite::Connection::open_with_flags(path, flags)
            .map_err(|e| CatalogError::Connection(format!("{}: {}", path, e)))?;
        check
            .query_row("SELECT COUNT(*) FROM Client", [], |row| row.get::<_, i64>(0))
            .map_err(|e| CatalogError::Connection(format!("{}: {}", path, e)))?;
        drop(check);

        let manager = SqliteConnectionManager::file(path).with_flags(flags);
        let db = Pool::builder().max_size(2).build(manager)?;

        info!(path = %path, "Opened SQLite catalog");
        Ok(Self { db })
    }
}

fn row_to_client(row: &Row) -> rusqlite::Result<Client> {
    Ok(Client {
        id: row.get("ClientId")?,
        name: row.get("Name")?,
    })
}

fn row_to_job(row: &Row, level: BackupLevel) -> rusqlite::Result<BackupJob> {
    let bytes: i64 = row.get("JobBytes")?;
    Ok(BackupJob {
        level,
        completed_at: row.get("RealEndTime")?,
        bytes: bytes.max(0) as u64,
    })
}

fn find_clients(db: &DbPool) -> Result<RowSet<Client>> {
    let conn = db.get()?;
    let mut stmt = conn.prepare(CLIENTS_SQL)?;
    let rows = stmt.query_map([], row_to_client)?;
    Ok(RowSet::collect(
        rows.map(|r| r.map_err(|e| CatalogError::decode("Client", e))),
    ))
}

fn find_level_jobs(
    db: &DbPool,
    level: BackupLevel,
    client_id: i64,
) -> Result<RowSet<BackupJob>> {
    let conn = db.get()?;
    let mut stmt = conn.prepare(LEVEL_JOBS_SQL)?;
    let rows = stmt.query_map(params![client_id, level.code()], |row| row_to_job(row, level))?;
    Ok(RowSet::collect(
        rows.map(|r| r.map_err(|e| CatalogError::decode("Job", e))),
    ))
}

#[async_trait]
impl CatalogStore for SqliteCatalog {
    async fn list_clients(&self) -> Result<RowSet<Client>> {
        let db = self.db.clone();
        let set = tokio::task::spawn_blocking(move || find_clients(&db)).await??;
        debug!(count = set.items.len(), "Listed clients");
        Ok(set)
    }

    async fn level_jobs(
        &self,
        level: BackupLevel,
        client: &Client,
    ) -> Result<RowSet<BackupJob>> {
        let db = self.db.clone();
        let client_id = client.id;
        tokio::task::spawn_blocking(move || find_level_jobs(&db, level, client_id)).await?
    }

    async fn close(&self) {
        // r2d2 closes connections when the pool is dropped.
        debug!(idle = self.db.state().idle_connections, "Closing SQLite catalog");
    }
}
