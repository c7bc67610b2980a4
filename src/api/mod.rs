//! API Module
//!
//! HTTP handlers and routing for the cache server REST API.
//!
//! # Endpoints
//! - `GET /api/cache/:key` - Get a value, generating it on a miss
//! - `GET /api/cache` - List stored keys and values
//! - `POST /api/cache` - Create or update a key
//! - `DELETE /api/cache/:key` - Delete a key
//! - `DELETE /api/cache` - Delete every key
//! - `GET /stats` - Get cache statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
