//! Expiring Cache - a size-bounded, time-expiring key/value cache server
//!
//! Values are generated on a miss, refreshed on every hit and evicted
//! least-recently-updated first once the cache is full. Records live in a
//! pluggable store (in-memory or SQLite).

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod store;
pub mod tasks;

pub use api::AppState;
pub use cache::{CacheEngine, CachePolicy};
pub use config::Config;
pub use error::{CacheError, Result};
pub use store::{MemoryRecordStore, RecordStore, SqliteRecordStore};
pub use tasks::spawn_reaper_task;
