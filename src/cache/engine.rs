//! Cache Engine Module
//!
//! Hit/miss resolution, expiry and capacity-bound eviction over an injected
//! `RecordStore`. The engine keeps no cached data of its own; every decision
//! re-reads the store.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, warn};

use crate::cache::{
    CacheEntry, CacheStats, Clock, NewEntry, StatsRecorder, SystemClock, MAX_KEY_LENGTH,
    MAX_VALUE_SIZE,
};
use crate::error::{CacheError, Result};
use crate::store::RecordStore;

// == Cache Policy ==
/// Capacity and freshness settings for one engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    max_size: u64,
    ttl: chrono::Duration,
}

impl CachePolicy {
    /// Validates and builds a policy.
    ///
    /// `max_size` must be at least 1 and `ttl` must fit a chrono duration.
    pub fn new(max_size: usize, ttl: Duration) -> Result<Self> {
        if max_size == 0 {
            return Err(CacheError::InvalidConfig(
                "max_size must be at least 1".to_string(),
            ));
        }
        let ttl = chrono::Duration::from_std(ttl)
            .map_err(|e| CacheError::InvalidConfig(format!("ttl out of range: {}", e)))?;

        Ok(Self {
            max_size: max_size as u64,
            ttl,
        })
    }

    pub fn max_size(&self) -> u64 {
        self.max_size
    }

    pub fn ttl(&self) -> chrono::Duration {
        self.ttl
    }
}

// == Lookup ==
/// Outcome of `CacheEngine::get`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Lookup {
    /// True if the value came from a fresh stored entry
    pub hit: bool,
    pub value: String,
}

// == Cached Pair ==
/// Key and value of one listed record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CachedPair {
    pub key: String,
    pub value: String,
}

impl From<CacheEntry> for CachedPair {
    fn from(entry: CacheEntry) -> Self {
        Self {
            key: entry.key,
            value: entry.value,
        }
    }
}

// == Snapshot ==
/// Records materialized by one `list` call, consumed once.
#[derive(Debug)]
pub struct Snapshot {
    entries: std::vec::IntoIter<CacheEntry>,
}

impl Iterator for Snapshot {
    type Item = CachedPair;

    fn next(&mut self) -> Option<Self::Item> {
        self.entries.next().map(CachedPair::from)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.entries.size_hint()
    }
}

impl ExactSizeIterator for Snapshot {}

// == Cache Engine ==
/// Size-bounded, time-expiring cache over a `RecordStore`.
///
/// Safe to share between concurrent requests; no lock is held across store
/// calls.
pub struct CacheEngine {
    store: Arc<dyn RecordStore>,
    policy: CachePolicy,
    clock: Arc<dyn Clock>,
    stats: StatsRecorder,
}

impl CacheEngine {
    // == Constructor ==
    /// Creates an engine reading the system clock.
    pub fn new(store: Arc<dyn RecordStore>, policy: CachePolicy) -> Self {
        Self::with_clock(store, policy, Arc::new(SystemClock))
    }

    /// Creates an engine with an explicit time source.
    pub fn with_clock(
        store: Arc<dyn RecordStore>,
        policy: CachePolicy,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            policy,
            clock,
            stats: StatsRecorder::new(),
        }
    }

    pub fn policy(&self) -> &CachePolicy {
        &self.policy
    }

    // == Get ==
    /// Returns the fresh value stored for `key`, or generates and admits one.
    ///
    /// A hit extends the entry's expiry. A stale entry is deleted and treated
    /// as a miss. `generator` runs at most once, and only on a miss.
    pub async fn get<F>(&self, key: &str, generator: F) -> Result<Lookup>
    where
        F: FnOnce() -> String + Send,
    {
        validate_key(key)?;
        let now = self.clock.now();

        if let Some(mut entry) = self.store.find_by_key(key).await? {
            if entry.is_stale(now) {
                let reaped = self.store.delete_one(key).await?;
                self.stats.record_reaps(reaped);
                debug!(key, "Reaped stale entry");
            } else {
                entry.refresh(now, self.policy.ttl);
                let touched = self
                    .store
                    .touch(entry.id, key, entry.expires_at, entry.updated_at)
                    .await?;
                if touched == 0 {
                    debug!(key, "Entry left its slot before the hit refresh landed");
                }
                self.stats.record_hit();
                debug!(key, "Cache hit");
                return Ok(Lookup {
                    hit: true,
                    value: entry.value,
                });
            }
        }

        self.stats.record_miss();
        debug!(key, "Cache miss");

        let value = generator();
        self.admit(NewEntry::fresh(key, value.clone(), now, self.policy.ttl))
            .await?;

        Ok(Lookup { hit: false, value })
    }

    // == Admission ==
    /// Inserts under capacity, otherwise overwrites the least recently
    /// updated record. A lost race on the key becomes an update.
    async fn admit(&self, entry: NewEntry) -> Result<()> {
        let result = if self.store.count_all().await? < self.policy.max_size {
            self.store.insert(entry.clone()).await.map(|_| ())
        } else {
            self.evict_into(entry.clone()).await
        };

        match result {
            Err(e) if e.is_duplicate_key() => self.overwrite_winner(entry).await,
            other => other,
        }
    }

    async fn evict_into(&self, entry: NewEntry) -> Result<()> {
        let Some(mut victim) = self.store.find_oldest_by_update_time().await? else {
            // Emptied since the count was taken
            return self.store.insert(entry).await.map(|_| ());
        };

        debug!(
            evicted = %victim.key,
            admitted = %entry.key,
            "Evicting least recently updated entry"
        );
        victim.reuse(entry);
        self.store.save(&victim).await?;
        self.stats.record_eviction();
        Ok(())
    }

    async fn overwrite_winner(&self, entry: NewEntry) -> Result<()> {
        self.stats.record_conflict();
        warn!(key = %entry.key, "Concurrent admission for key, last write wins");

        match self.store.find_by_key(&entry.key).await? {
            Some(mut winner) => {
                winner.reuse(entry);
                self.store.save(&winner).await
            }
            None => self.store.insert(entry).await.map(|_| ()),
        }
    }

    // == List ==
    /// Snapshot of every physically present record in store order.
    pub async fn list(&self) -> Result<Snapshot> {
        let entries = self.store.list_all().await?;
        Ok(Snapshot {
            entries: entries.into_iter(),
        })
    }

    // == Upsert ==
    /// Creates or overwrites the value for `key` and returns what the store
    /// now holds.
    ///
    /// Ignores capacity and leaves an existing entry's expiry untouched.
    pub async fn upsert(&self, key: &str, value: &str) -> Result<String> {
        validate_key(key)?;
        validate_value(value)?;
        let now = self.clock.now();

        self.store
            .upsert_value(NewEntry::fresh(key, value, now, self.policy.ttl))
            .await?;

        self.store
            .find_by_key(key)
            .await?
            .map(|record| record.value)
            .ok_or_else(|| CacheError::Internal(format!("Key '{}' missing after upsert", key)))
    }

    // == Remove ==
    /// Deletes `key`, returning whether a record existed.
    pub async fn remove(&self, key: &str) -> Result<bool> {
        validate_key(key)?;
        Ok(self.store.delete_one(key).await? > 0)
    }

    /// Deletes every record, returning whether anything was deleted.
    pub async fn remove_all(&self) -> Result<bool> {
        Ok(self.store.delete_all().await? > 0)
    }

    // == Reap Expired ==
    /// Deletes all entries that are stale now. Returns the number removed.
    pub async fn reap_expired(&self) -> Result<u64> {
        let removed = self.store.delete_expired(self.clock.now()).await?;
        self.stats.record_reaps(removed);
        Ok(removed)
    }

    // == Stats ==
    pub async fn stats(&self) -> Result<CacheStats> {
        let total = self.store.count_all().await?;
        Ok(self.stats.snapshot(total))
    }
}

// == Validation ==
/// Rejects empty keys and keys longer than `MAX_KEY_LENGTH` bytes.
pub fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(CacheError::InvalidRequest("Key cannot be empty".to_string()));
    }
    if key.len() > MAX_KEY_LENGTH {
        return Err(CacheError::InvalidRequest(format!(
            "Key exceeds maximum length of {} bytes",
            MAX_KEY_LENGTH
        )));
    }
    Ok(())
}

/// Rejects values larger than `MAX_VALUE_SIZE` bytes.
pub fn validate_value(value: &str) -> Result<()> {
    if value.len() > MAX_VALUE_SIZE {
        return Err(CacheError::InvalidRequest(format!(
            "Value exceeds maximum size of {} bytes",
            MAX_VALUE_SIZE
        )));
    }
    Ok(())
}
