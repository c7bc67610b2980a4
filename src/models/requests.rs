//! Request DTOs for the cache server API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;

use crate::cache::{validate_key, validate_value};
use crate::error::Result;

/// Request body for the upsert operation (POST /api/cache)
#[derive(Debug, Clone, Deserialize)]
pub struct UpsertRequest {
    /// The cache key
    pub key: String,
    /// The value to store
    pub value: String,
}

impl UpsertRequest {
    /// Validates the request data
    ///
    /// Applies the same key and value limits as the cache engine.
    pub fn validate(&self) -> Result<()> {
        validate_key(&self.key)?;
        validate_value(&self.value)
    }
}
