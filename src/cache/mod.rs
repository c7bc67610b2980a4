//! Cache Module
//!
//! Size-bounded, time-expiring cache logic over a pluggable record store.

mod clock;
mod engine;
mod entry;
mod stats;


// Re-export public types
pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::{
    validate_key, validate_value, CacheEngine, CachePolicy, CachedPair, Lookup, Snapshot,
};
pub use entry::{CacheEntry, NewEntry, RecordId};
pub use stats::{CacheStats, StatsRecorder};

// == Public Constants ==
/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 256;

/// Maximum allowed value size in bytes
pub const MAX_VALUE_SIZE: usize = 1024 * 1024; // 1 MB
