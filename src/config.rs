//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

use crate::cache::CachePolicy;
use crate::error::Result;

/// Value of `DATABASE_URL` that selects the in-memory store.
pub const MEMORY_STORE_URL: &str = "memory";

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum number of entries the cache can hold
    pub max_entries: usize,
    /// Freshness window in seconds, extended on every hit
    pub default_ttl: u64,
    /// HTTP server port
    pub server_port: u16,
    /// Record store location (`memory` or a sqlx SQLite URL)
    pub database_url: String,
    /// Background reaper interval in seconds, 0 disables it
    pub reap_interval: u64,
    /// Store connection and lock timeout in seconds
    pub store_timeout: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `MAX_ENTRIES` - Maximum cache entries, at least 1 (default: 10)
    /// - `DEFAULT_TTL` - Entry TTL in seconds (default: 18000)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `DATABASE_URL` - Store URL (default: `sqlite://cache.db?mode=rwc`)
    /// - `REAP_INTERVAL` - Reaper frequency in seconds (default: 60)
    /// - `STORE_TIMEOUT` - Store timeout in seconds (default: 5)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let max_entries = match parse_var::<usize>("MAX_ENTRIES") {
            Some(0) => {
                warn!("MAX_ENTRIES must be at least 1, using {}", defaults.max_entries);
                defaults.max_entries
            }
            Some(n) => n,
            None => defaults.max_entries,
        };

        Self {
            max_entries,
            default_ttl: parse_var("DEFAULT_TTL").unwrap_or(defaults.default_ttl),
            server_port: parse_var("SERVER_PORT").unwrap_or(defaults.server_port),
            database_url: env::var("DATABASE_URL")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.database_url),
            reap_interval: parse_var("REAP_INTERVAL").unwrap_or(defaults.reap_interval),
            store_timeout: parse_var("STORE_TIMEOUT").unwrap_or(defaults.store_timeout),
        }
    }

    /// Builds the engine policy from the capacity and TTL settings.
    pub fn policy(&self) -> Result<CachePolicy> {
        CachePolicy::new(self.max_entries, Duration::from_secs(self.default_ttl))
    }

    /// Returns true if the in-memory store was requested.
    pub fn uses_memory_store(&self) -> bool {
        self.database_url.eq_ignore_ascii_case(MEMORY_STORE_URL)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_entries: 10,
            default_ttl: 60 * 60 * 5,
            server_port: 3000,
            database_url: "sqlite://cache.db?mode=rwc".to_string(),
            reap_interval: 60,
            store_timeout: 5,
        }
    }
}

fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.max_entries, 10);
        assert_eq!(config.default_ttl, 18_000);
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.reap_interval, 60);
        assert!(!config.uses_memory_store());
    }

    #[test]
    fn test_config_from_env() {
        // Single test touches the environment to avoid races between tests
        for name in [
            "MAX_ENTRIES",
            "DEFAULT_TTL",
            "SERVER_PORT",
            "DATABASE_URL",
            "REAP_INTERVAL",
            "STORE_TIMEOUT",
        ] {
            env::remove_var(name);
        }

        let config = Config::from_env();
        assert_eq!(config.max_entries, 10);
        assert_eq!(config.default_ttl, 18_000);
        assert_eq!(config.server_port, 3000);

        env::set_var("MAX_ENTRIES", "0");
        env::set_var("DEFAULT_TTL", "not-a-number");
        env::set_var("DATABASE_URL", "memory");
        let config = Config::from_env();
        assert_eq!(config.max_entries, 10);
        assert_eq!(config.default_ttl, 18_000);
        assert!(config.uses_memory_store());

        env::set_var("MAX_ENTRIES", "25");
        env::set_var("DEFAULT_TTL", "120");
        let config = Config::from_env();
        assert_eq!(config.max_entries, 25);
        assert_eq!(config.policy().unwrap().ttl(), chrono::Duration::seconds(120));

        env::remove_var("MAX_ENTRIES");
        env::remove_var("DEFAULT_TTL");
        env::remove_var("DATABASE_URL");
    }
}
