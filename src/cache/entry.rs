//! Cache Entry Module
//!
//! Defines the stored record and its freshness rules.

use chrono::{DateTime, Utc};
use serde::Serialize;

// == Record Id ==
/// Store-assigned identity of a record.
///
/// Stays the same when an evicted slot is reused for a different key.
pub type RecordId = i64;

// == Cache Entry ==
/// A single persisted cache record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheEntry {
    /// Store identity
    pub id: RecordId,
    /// Unique key within the store
    pub key: String,
    /// Opaque payload, replaced wholesale on write
    pub value: String,
    /// The entry is stale once the current time is past this instant
    pub expires_at: DateTime<Utc>,
    /// Time of the last write, used only to choose eviction victims
    pub updated_at: DateTime<Utc>,
}

impl CacheEntry {
    // == Is Stale ==
    /// Checks whether the entry has expired at `now`.
    ///
    /// An entry expiring exactly at `now` is still fresh.
    pub fn is_stale(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    // == Refresh ==
    /// Extends the expiry to `now + ttl` and marks the entry as written at `now`.
    pub fn refresh(&mut self, now: DateTime<Utc>, ttl: chrono::Duration) {
        self.expires_at = now + ttl;
        self.updated_at = now;
    }

    // == Reuse ==
    /// Overwrites this slot in place with a different key and value.
    pub fn reuse(&mut self, new: NewEntry) {
        self.key = new.key;
        self.value = new.value;
        self.expires_at = new.expires_at;
        self.updated_at = new.updated_at;
    }
}

// == New Entry ==
/// A record that has not been assigned an id yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEntry {
    pub key: String,
    pub value: String,
    pub expires_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl NewEntry {
    /// Creates a record written at `now` that stays fresh for `ttl`.
    pub fn fresh(
        key: impl Into<String>,
        value: impl Into<String>,
        now: DateTime<Utc>,
        ttl: chrono::Duration,
    ) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            expires_at: now + ttl,
            updated_at: now,
        }
    }

    /// Attaches a store id.
    pub fn with_id(self, id: RecordId) -> CacheEntry {
        CacheEntry {
            id,
            key: self.key,
            value: self.value,
            expires_at: self.expires_at,
            updated_at: self.updated_at,
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    fn entry(now: DateTime<Utc>, ttl_secs: i64) -> CacheEntry {
        NewEntry::fresh("key", "value", now, chrono::Duration::seconds(ttl_secs)).with_id(1)
    }

    #[test]
    fn test_fresh_entry_timestamps() {
        let now = Utc::now();
        let entry = entry(now, 60);

        assert_eq!(entry.updated_at, now);
        assert_eq!(entry.expires_at, now + chrono::Duration::seconds(60));
        assert!(!entry.is_stale(now));
    }

    #[test]
    fn test_expiration_boundary_condition() {
        let now = Utc::now();
        let entry = entry(now, 10);

        assert!(!entry.is_stale(entry.expires_at), "Fresh exactly at expires_at");
        assert!(entry.is_stale(entry.expires_at + chrono::Duration::milliseconds(1)));
    }

    #[test]
    fn test_refresh_extends_expiry() {
        let now = Utc::now();
        let mut entry = entry(now, 10);
        let later = now + chrono::Duration::seconds(8);

        entry.refresh(later, chrono::Duration::seconds(10));

        assert_eq!(entry.expires_at, later + chrono::Duration::seconds(10));
        assert_eq!(entry.updated_at, later);
        assert!(!entry.is_stale(now + chrono::Duration::seconds(15)));
    }

    #[test]
    fn test_reuse_keeps_id() {
        let now = Utc::now();
        let mut entry = entry(now, 10);
        let later = now + chrono::Duration::seconds(1);

        entry.reuse(NewEntry::fresh("other", "v2", later, chrono::Duration::seconds(10)));

        assert_eq!(entry.id, 1);
        assert_eq!(entry.key, "other");
        assert_eq!(entry.value, "v2");
        assert_eq!(entry.updated_at, later);
    }
}
