//! Reading Store: durable append-only log of temperature readings.
//!
//! Backed by a single SQLite table. Appends are serialized through a
//! single-writer lock; reads go straight to the pool and may run
//! concurrently with a write (WAL journal, so a reader never sees a
//! partially written row).

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, SubsecRound, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use tokio::sync::Mutex;

use crate::config::DatabaseConfig;
use crate::error::StoreError;
use crate::models::reading::format_timestamp;
use crate::models::{Reading, ReadingRow, SortOrder};

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS tempreading (
    inside_temp REAL NOT NULL,
    outside_temp REAL NOT NULL,
    created_at TEXT NOT NULL
)";

const CREATE_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_tempreading_created_at ON tempreading (created_at)";

/// Owned handle to the store. Cheap to clone; clones share the pool and
/// the writer lock.
#[derive(Debug, Clone)]
pub struct ReadingStore {
    pool: SqlitePool,
    write_lock: Arc<Mutex<()>>,
}

impl ReadingStore {
    /// Open (creating if needed) the database and ensure the schema exists.
    /// Safe to call on every start.
    pub async fn initialize(config: &DatabaseConfig) -> Result<Self, StoreError> {
        if let Some(parent) = Path::new(&config.path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| StoreError::StorageUnavailable(sqlx::Error::Io(e)))?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(&config.path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections.max(1))
            .connect_with(options)
            .await
            .map_err(StoreError::StorageUnavailable)?;

        let store = Self {
            pool,
            write_lock: Arc::new(Mutex::new(())),
        };
        store.ensure_schema().await?;

        tracing::info!(path = %config.path, "Reading store ready");
        Ok(store)
    }

    async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(CREATE_TABLE)
            .execute(&self.pool)
            .await
            .map_err(StoreError::StorageUnavailable)?;
        sqlx::query(CREATE_INDEX)
            .execute(&self.pool)
            .await
            .map_err(StoreError::StorageUnavailable)?;
        Ok(())
    }

    /// Insert one immutable row. Returns the reading as stored
    /// (timestamp truncated to millisecond precision).
    pub async fn append(
        &self,
        inside_temp: f64,
        outside_temp: f64,
        created_at: DateTime<Utc>,
    ) -> Result<Reading, StoreError> {
        let created_at = created_at.trunc_subsecs(3);
        let encoded = format_timestamp(&created_at);

        let _writer = self.write_lock.lock().await;
        sqlx::query(
            "INSERT INTO tempreading (inside_temp, outside_temp, created_at) VALUES (?, ?, ?)",
        )
        .bind(inside_temp)
        .bind(outside_temp)
        .bind(&encoded)
        .execute(&self.pool)
        .await
        .map_err(StoreError::Write)?;

        tracing::debug!(inside_temp, outside_temp, created_at = %encoded, "Reading appended");

        Ok(Reading {
            inside_temp,
            outside_temp,
            created_at,
        })
    }

    /// Row with the greatest `created_at`, ties going to the last inserted.
    pub async fn latest(&self) -> Result<Option<Reading>, StoreError> {
        let row: Option<ReadingRow> = sqlx::query_as(
            "SELECT inside_temp, outside_temp, created_at FROM tempreading
             ORDER BY created_at DESC, rowid DESC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::Read)?;

        row.map(to_reading).transpose()
    }

    /// Every row ordered by `created_at`, ties broken by insertion order.
    /// Descending is always the exact reverse of ascending.
    pub async fn all_ordered(&self, order: SortOrder) -> Result<Vec<Reading>, StoreError> {
        let dir = order.as_sql();
        let sql = format!(
            "SELECT inside_temp, outside_temp, created_at FROM tempreading
             ORDER BY created_at {dir}, rowid {dir}"
        );

        let rows: Vec<ReadingRow> = sqlx::query_as(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(StoreError::Read)?;

        rows.into_iter().map(to_reading).collect()
    }

    pub async fn count(&self) -> Result<i64, StoreError> {
        sqlx::query_scalar("SELECT COUNT(*) FROM tempreading")
            .fetch_one(&self.pool)
            .await
            .map_err(StoreError::Read)
    }

    pub async fn health_check(&self) -> Result<String, StoreError> {
        let row: (String,) = sqlx::query_as("SELECT sqlite_version()")
            .fetch_one(&self.pool)
            .await
            .map_err(StoreError::Read)?;
        Ok(row.0)
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn to_reading(row: ReadingRow) -> Result<Reading, StoreError> {
    Reading::try_from(row).map_err(|e| StoreError::Read(sqlx::Error::Decode(Box::new(e))))
}
