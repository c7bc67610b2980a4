//! Record Store Module
//!
//! The durable keyed storage the cache engine runs on.
//!
//! # Backends
//! - `MemoryRecordStore` - process-local store for tests and development
//! - `SqliteRecordStore` - SQLite database through sqlx

mod memory;
mod sqlite;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::cache::{CacheEntry, NewEntry, RecordId};
use crate::error::Result;

pub use memory::MemoryRecordStore;
pub use sqlite::SqliteRecordStore;

// == Record Store Trait ==
/// Persistence operations consumed by the cache engine.
///
/// Implementations enforce key uniqueness. Writes that would give a key to a
/// second record fail with `CacheError::DuplicateKey`; any failure to reach the
/// backend is reported as `CacheError::StoreUnavailable`.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Looks up the record holding `key`.
    async fn find_by_key(&self, key: &str) -> Result<Option<CacheEntry>>;

    /// Returns the number of physically present records, stale ones included.
    async fn count_all(&self) -> Result<u64>;

    /// Returns the record with the smallest `updated_at`.
    ///
    /// Ties go to the record with the lowest id.
    async fn find_oldest_by_update_time(&self) -> Result<Option<CacheEntry>>;

    /// Creates a record, failing with `DuplicateKey` if the key exists.
    async fn insert(&self, entry: NewEntry) -> Result<CacheEntry>;

    /// Overwrites every field of the record identified by `entry.id`.
    async fn save(&self, entry: &CacheEntry) -> Result<()>;

    /// Moves the timestamps of record `id` forward, but only while it still
    /// holds `key`.
    ///
    /// Returns 0 when the record was deleted or handed to another key since
    /// it was read; key and value are never written.
    async fn touch(
        &self,
        id: RecordId,
        key: &str,
        expires_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Result<u64>;

    /// Creates the record if the key is absent, otherwise replaces its value
    /// and `updated_at`, leaving `expires_at` untouched.
    async fn upsert_value(&self, entry: NewEntry) -> Result<()>;

    /// Deletes the record holding `key`, returning 0 or 1.
    async fn delete_one(&self, key: &str) -> Result<u64>;

    /// Deletes every record, returning how many were removed.
    async fn delete_all(&self) -> Result<u64>;

    /// Returns all records in ascending id order.
    async fn list_all(&self) -> Result<Vec<CacheEntry>>;

    /// Deletes every record that is stale at `now`.
    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64>;
}
