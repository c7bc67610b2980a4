//! SQLite Record Store
//!
//! Durable `RecordStore` on a SQLite database through sqlx.
//!
//! ## Schema
//!
//! ```sql
//! CREATE TABLE cache_entries (
//!     id INTEGER PRIMARY KEY AUTOINCREMENT,
//!     key TEXT NOT NULL UNIQUE,
//!     value TEXT NOT NULL,
//!     expires_at INTEGER NOT NULL,
//!     updated_at INTEGER NOT NULL
//! );
//! ```
//!
//! Timestamps are stored as Unix milliseconds.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use tracing::info;

use crate::cache::{CacheEntry, NewEntry, RecordId};
use crate::error::{CacheError, Result};
use crate::store::RecordStore;

const SELECT_COLUMNS: &str = "SELECT id, key, value, expires_at, updated_at FROM cache_entries";

// == SQLite Record Store ==
/// `RecordStore` persisted in a SQLite database.
#[derive(Debug, Clone)]
pub struct SqliteRecordStore {
    pool: SqlitePool,
}

impl SqliteRecordStore {
    // == Connect ==
    /// Opens (creating if needed) the database at `database_url` and makes
    /// sure the schema exists.
    ///
    /// `timeout` bounds both pool acquisition and lock waits; exceeding it
    /// surfaces as `StoreUnavailable`.
    ///
    /// # Examples
    /// - `sqlite::memory:` - private in-memory database
    /// - `sqlite://cache.db?mode=rwc` - file database
    pub async fn connect(database_url: &str, timeout: Duration) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| CacheError::InvalidConfig(format!("Bad database URL: {}", e)))?
            .create_if_missing(true)
            .busy_timeout(timeout);

        let mut pool_options = SqlitePoolOptions::new().acquire_timeout(timeout);
        if database_url.contains(":memory:") {
            // Every connection to `:memory:` opens a separate database, and
            // closing the only one drops it
            pool_options = pool_options
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        }

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(store_error)?;

        let store = Self::from_pool(pool);
        store.create_table().await?;
        info!("SQLite record store ready at {}", database_url);
        Ok(store)
    }

    /// Wraps an existing pool without touching the schema.
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // == Create Table ==
    /// Creates the `cache_entries` table and its eviction index if missing.
    pub async fn create_table(&self) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS cache_entries (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                key TEXT NOT NULL UNIQUE,
                value TEXT NOT NULL,
                expires_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(store_error)?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_cache_entries_updated_at
             ON cache_entries (updated_at, id)",
        )
        .execute(&self.pool)
        .await
        .map_err(store_error)?;

        Ok(())
    }
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn find_by_key(&self, key: &str) -> Result<Option<CacheEntry>> {
        let row = sqlx::query(&format!("{} WHERE key = ?", SELECT_COLUMNS))
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)?;

        row.as_ref().map(entry_from_row).transpose()
    }

    async fn count_all(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM cache_entries")
            .fetch_one(&self.pool)
            .await
            .map_err(store_error)?;

        Ok(count as u64)
    }

    async fn find_oldest_by_update_time(&self) -> Result<Option<CacheEntry>> {
        let row = sqlx::query(&format!(
            "{} ORDER BY updated_at ASC, id ASC LIMIT 1",
            SELECT_COLUMNS
        ))
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error)?;

        row.as_ref().map(entry_from_row).transpose()
    }

    async fn insert(&self, entry: NewEntry) -> Result<CacheEntry> {
        let result = sqlx::query(
            "INSERT INTO cache_entries (key, value, expires_at, updated_at)
             VALUES (?, ?, ?, ?)",
        )
        .bind(&entry.key)
        .bind(&entry.value)
        .bind(entry.expires_at.timestamp_millis())
        .bind(entry.updated_at.timestamp_millis())
        .execute(&self.pool)
        .await
        .map_err(|e| write_error(e, &entry.key))?;

        Ok(entry.with_id(result.last_insert_rowid()))
    }

    async fn save(&self, entry: &CacheEntry) -> Result<()> {
        sqlx::query(
            "UPDATE cache_entries
             SET key = ?, value = ?, expires_at = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(&entry.key)
        .bind(&entry.value)
        .bind(entry.expires_at.timestamp_millis())
        .bind(entry.updated_at.timestamp_millis())
        .bind(entry.id)
        .execute(&self.pool)
        .await
        .map_err(|e| write_error(e, &entry.key))?;

        Ok(())
    }

    async fn touch(
        &self,
        id: RecordId,
        key: &str,
        expires_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE cache_entries
             SET expires_at = ?, updated_at = ?
             WHERE id = ? AND key = ?",
        )
        .bind(expires_at.timestamp_millis())
        .bind(updated_at.timestamp_millis())
        .bind(id)
        .bind(key)
        .execute(&self.pool)
        .await
        .map_err(store_error)?;

        Ok(result.rows_affected())
    }

    async fn upsert_value(&self, entry: NewEntry) -> Result<()> {
        sqlx::query(
            "INSERT INTO cache_entries (key, value, expires_at, updated_at)
             VALUES (?, ?, ?, ?)
             ON CONFLICT (key) DO UPDATE
             SET value = excluded.value, updated_at = excluded.updated_at",
        )
        .bind(&entry.key)
        .bind(&entry.value)
        .bind(entry.expires_at.timestamp_millis())
        .bind(entry.updated_at.timestamp_millis())
        .execute(&self.pool)
        .await
        .map_err(store_error)?;

        Ok(())
    }

    async fn delete_one(&self, key: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM cache_entries WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(store_error)?;

        Ok(result.rows_affected())
    }

    async fn delete_all(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM cache_entries")
            .execute(&self.pool)
            .await
            .map_err(store_error)?;

        Ok(result.rows_affected())
    }

    async fn list_all(&self) -> Result<Vec<CacheEntry>> {
        let rows = sqlx::query(&format!("{} ORDER BY id ASC", SELECT_COLUMNS))
            .fetch_all(&self.pool)
            .await
            .map_err(store_error)?;

        rows.iter().map(entry_from_row).collect()
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query("DELETE FROM cache_entries WHERE expires_at < ?")
            .bind(now.timestamp_millis())
            .execute(&self.pool)
            .await
            .map_err(store_error)?;

        Ok(result.rows_affected())
    }
}

// == Row Mapping ==
fn entry_from_row(row: &SqliteRow) -> Result<CacheEntry> {
    Ok(CacheEntry {
        id: row.try_get("id").map_err(store_error)?,
        key: row.try_get("key").map_err(store_error)?,
        value: row.try_get("value").map_err(store_error)?,
        expires_at: timestamp_column(row, "expires_at")?,
        updated_at: timestamp_column(row, "updated_at")?,
    })
}

fn timestamp_column(row: &SqliteRow, column: &str) -> Result<DateTime<Utc>> {
    let millis: i64 = row.try_get(column).map_err(store_error)?;
    DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| CacheError::Internal(format!("Invalid {} timestamp: {}", column, millis)))
}

// == Error Mapping ==
fn store_error(e: sqlx::Error) -> CacheError {
    CacheError::StoreUnavailable(e.to_string())
}

fn write_error(e: sqlx::Error, key: &str) -> CacheError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            CacheError::DuplicateKey(key.to_string())
        }
        _ => store_error(e),
    }
}
