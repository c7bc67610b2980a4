//! API Handlers
//!
//! HTTP request handlers for each cache server endpoint.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::cache::{CacheEngine, CachePolicy, CachedPair};
use crate::config::Config;
use crate::error::Result;
use crate::models::{
    ClearResponse, DeleteResponse, GetResponse, HealthResponse, StatsResponse, UpsertRequest,
    UpsertResponse,
};
use crate::store::{MemoryRecordStore, RecordStore, SqliteRecordStore};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Cache engine, shared by concurrent requests
    pub cache: Arc<CacheEngine>,
}

impl AppState {
    /// Creates a new AppState around an engine.
    pub fn new(cache: CacheEngine) -> Self {
        Self {
            cache: Arc::new(cache),
        }
    }

    /// Creates an AppState over a fresh in-memory store.
    pub fn in_memory(policy: CachePolicy) -> Self {
        Self::new(CacheEngine::new(Arc::new(MemoryRecordStore::new()), policy))
    }

    /// Creates a new AppState from configuration.
    ///
    /// Connects the configured record store and builds the engine policy.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let store: Arc<dyn RecordStore> = if config.uses_memory_store() {
            Arc::new(MemoryRecordStore::new())
        } else {
            let timeout = Duration::from_secs(config.store_timeout);
            Arc::new(SqliteRecordStore::connect(&config.database_url, timeout).await?)
        };

        Ok(Self::new(CacheEngine::new(store, config.policy()?)))
    }
}

/// Handler for GET /api/cache/:key
///
/// Returns the cached value, generating a random UUID on a miss.
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<GetResponse>> {
    let lookup = state
        .cache
        .get(&key, || Uuid::new_v4().to_string())
        .await?;

    Ok(Json(GetResponse::new(key, lookup.value, lookup.hit)))
}

/// Handler for GET /api/cache
///
/// Lists every stored key with its value.
pub async fn list_handler(State(state): State<AppState>) -> Result<Json<Vec<CachedPair>>> {
    let pairs = state.cache.list().await?.collect();
    Ok(Json(pairs))
}

/// Handler for POST /api/cache
///
/// Creates or overwrites a key without eviction.
pub async fn upsert_handler(
    State(state): State<AppState>,
    Json(req): Json<UpsertRequest>,
) -> Result<Json<UpsertResponse>> {
    req.validate()?;

    let value = state.cache.upsert(&req.key, &req.value).await?;

    Ok(Json(UpsertResponse::new(req.key, value)))
}

/// Handler for DELETE /api/cache/:key
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<DeleteResponse>> {
    let deleted = state.cache.remove(&key).await?;
    Ok(Json(DeleteResponse::new(key, deleted)))
}

/// Handler for DELETE /api/cache
pub async fn clear_handler(State(state): State<AppState>) -> Result<Json<ClearResponse>> {
    let deleted = state.cache.remove_all().await?;
    Ok(Json(ClearResponse { deleted }))
}

/// Handler for GET /stats
///
/// Returns current cache statistics.
pub async fn stats_handler(State(state): State<AppState>) -> Result<Json<StatsResponse>> {
    let stats = state.cache.stats().await?;
    Ok(Json(StatsResponse::from(stats)))
}

/// Handler for GET /health
///
/// Returns health status of the server.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
