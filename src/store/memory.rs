//! In-Memory Record Store
//!
//! Process-local `RecordStore` with the same uniqueness and ordering rules as
//! the database backend.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use crate::cache::{CacheEntry, NewEntry, RecordId};
use crate::error::{CacheError, Result};
use crate::store::RecordStore;

#[derive(Debug, Default)]
struct Records {
    next_id: RecordId,
    /// Records by id, iterated in store-native order
    by_id: BTreeMap<RecordId, CacheEntry>,
    /// Unique key index
    by_key: HashMap<String, RecordId>,
}

impl Records {
    fn insert(&mut self, entry: NewEntry) -> Result<CacheEntry> {
        if self.by_key.contains_key(&entry.key) {
            return Err(CacheError::DuplicateKey(entry.key));
        }

        self.next_id += 1;
        let record = entry.with_id(self.next_id);
        self.by_key.insert(record.key.clone(), record.id);
        self.by_id.insert(record.id, record.clone());
        Ok(record)
    }

    fn remove(&mut self, id: RecordId) -> Option<CacheEntry> {
        let record = self.by_id.remove(&id)?;
        self.by_key.remove(&record.key);
        Some(record)
    }
}

// == Memory Record Store ==
/// `RecordStore` kept entirely in process memory.
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    records: Mutex<Records>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn find_by_key(&self, key: &str) -> Result<Option<CacheEntry>> {
        let records = self.records.lock();
        Ok(records
            .by_key
            .get(key)
            .and_then(|id| records.by_id.get(id))
            .cloned())
    }

    async fn count_all(&self) -> Result<u64> {
        Ok(self.records.lock().by_id.len() as u64)
    }

    async fn find_oldest_by_update_time(&self) -> Result<Option<CacheEntry>> {
        let records = self.records.lock();
        // min_by_key keeps the first minimum, which is the lowest id
        Ok(records
            .by_id
            .values()
            .min_by_key(|entry| entry.updated_at)
            .cloned())
    }

    async fn insert(&self, entry: NewEntry) -> Result<CacheEntry> {
        self.records.lock().insert(entry)
    }

    async fn save(&self, entry: &CacheEntry) -> Result<()> {
        let mut records = self.records.lock();

        let Some(old_key) = records.by_id.get(&entry.id).map(|e| e.key.clone()) else {
            // Deleted concurrently; the write has nothing to land on
            return Ok(());
        };

        if old_key != entry.key {
            if records.by_key.contains_key(&entry.key) {
                return Err(CacheError::DuplicateKey(entry.key.clone()));
            }
            records.by_key.remove(&old_key);
            records.by_key.insert(entry.key.clone(), entry.id);
        }

        records.by_id.insert(entry.id, entry.clone());
        Ok(())
    }

    async fn touch(
        &self,
        id: RecordId,
        key: &str,
        expires_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Result<u64> {
        let mut records = self.records.lock();
        match records.by_id.get_mut(&id) {
            Some(record) if record.key == key => {
                record.expires_at = expires_at;
                record.updated_at = updated_at;
                Ok(1)
            }
            _ => Ok(0),
        }
    }

    async fn upsert_value(&self, entry: NewEntry) -> Result<()> {
        let mut records = self.records.lock();

        match records.by_key.get(&entry.key).copied() {
            Some(id) => {
                if let Some(existing) = records.by_id.get_mut(&id) {
                    existing.value = entry.value;
                    existing.updated_at = entry.updated_at;
                }
                Ok(())
            }
            None => records.insert(entry).map(|_| ()),
        }
    }

    async fn delete_one(&self, key: &str) -> Result<u64> {
        let mut records = self.records.lock();
        let removed = records
            .by_key
            .get(key)
            .copied()
            .and_then(|id| records.remove(id));
        Ok(u64::from(removed.is_some()))
    }

    async fn delete_all(&self) -> Result<u64> {
        let mut records = self.records.lock();
        let count = records.by_id.len() as u64;
        records.by_id.clear();
        records.by_key.clear();
        Ok(count)
    }

    async fn list_all(&self) -> Result<Vec<CacheEntry>> {
        Ok(self.records.lock().by_id.values().cloned().collect())
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let mut records = self.records.lock();
        let stale: Vec<RecordId> = records
            .by_id
            .values()
            .filter(|entry| entry.is_stale(now))
            .map(|entry| entry.id)
            .collect();

        for id in &stale {
            records.remove(*id);
        }
        Ok(stale.len() as u64)
    }
}
