//! Database connection management
//!
//! The control-plane database holds tenant configuration. Per-tenant pools
//! live in [`crate::router`].

use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use thiserror::Error;

use crate::config::ControlDbConfig;

/// Failures talking to a backing store.
///
/// `PoolExhausted` and `Unavailable` are infrastructure faults the client may
/// retry with backoff. `InvalidRow` means stored data violates a column
/// contract.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("connection pool exhausted: acquire timed out")]
    PoolExhausted,

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("invalid row: {0}")]
    InvalidRow(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::PoolTimedOut => StoreError::PoolExhausted,
            sqlx::Error::ColumnNotFound(col) => StoreError::InvalidRow(format!("missing column {col}")),
            sqlx::Error::ColumnDecode { index, source } => {
                StoreError::InvalidRow(format!("column {index}: {source}"))
            }
            other => StoreError::Unavailable(other.to_string()),
        }
    }
}

/// SQLSTATE 23505: unique_violation.
pub fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
}

/// PostgreSQL control-plane connection pool
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool
    pub async fn connect(config: &ControlDbConfig) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_millis(config.acquire_timeout_ms))
            .connect(&config.url)
            .await?;

        tracing::info!("Control-plane PostgreSQL pool established");
        Ok(Self { pool })
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Check database health
    pub async fn health_check(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Drain and close the pool. Safe to call more than once.
    pub async fn close(&self) {
        if !self.pool.is_closed() {
            self.pool.close().await;
            tracing::info!("Control-plane PostgreSQL pool closed");
        }
    }
}

/// Extension trait for safe row access with logging
pub trait SafeRow {
    /// Try to get a value from a column, log error and return None if it fails
    fn try_get_log<'r, T>(&'r self, column: &str) -> Option<T>
    where
        T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>;

    /// Like `try_get_log` but a missing/undecodable column is an error.
    fn require<'r, T>(&'r self, column: &str) -> Result<T, StoreError>
    where
        T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
    {
        self.try_get_log(column)
            .ok_or_else(|| StoreError::InvalidRow(format!("column '{}'", column)))
    }
}

impl SafeRow for sqlx::postgres::PgRow {
    fn try_get_log<'r, T>(&'r self, column: &str) -> Option<T>
    where
        T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
    {
        use sqlx::Row;
        match self.try_get(column) {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::error!("Failed to read column '{}': {}", column, e);
                None
            }
        }
    }
}
