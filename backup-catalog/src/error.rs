//! Error types for catalog access.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Unknown catalog driver in URL '{0}' (expected mysql:// or sqlite://)")]
    UnknownDriver(String),

    #[error("Catalog connection failed: {0}")]
    Connection(String),

    #[error("Catalog query failed: {0}")]
    Query(String),

    #[error("Failed to decode {table} row: {message}")]
    Decode { table: &'static str, message: String },

    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("Catalog task failed: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

impl CatalogError {
    pub(crate) fn decode(table: &'static str, err: impl std::fmt::Display) -> Self {
        CatalogError::Decode {
            table,
            message: err.to_string(),
        }
    }
}

impl From<sqlx::Error> for CatalogError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::Configuration(_) => CatalogError::Connection(e.to_string()),
            other => CatalogError::Query(other.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CatalogError {
    fn from(e: rusqlite::Error) -> Self {
        CatalogError::Query(e.to_string())
    }
}
