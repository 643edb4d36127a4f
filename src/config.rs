//! Configuration Module
//!
//! Handles loading and managing cache and server configuration from environment variables.

use std::env;
use std::str::FromStr;

use crate::cache::DEFAULT_TTL;

/// Cache and server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Entry count garbage collection trims the cache down to
    pub max_size: usize,
    /// Fraction of `max_size` at which a write runs GC synchronously
    pub gc_threshold: f64,
    /// Default TTL in seconds for entries written without one
    pub default_ttl: u64,
    /// GC tick period in seconds
    pub gc_interval: u64,
    /// Revalidation tick period in seconds
    pub revalidation_interval: u64,
    /// HTTP port of the admin API
    pub server_port: u16,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_MAX_SIZE` - Maximum cache entries (default: 1000)
    /// - `CACHE_GC_THRESHOLD` - Fraction of max size triggering GC on write (default: 0.8)
    /// - `CACHE_DEFAULT_TTL` - Default TTL in seconds (default: 300)
    /// - `CACHE_GC_INTERVAL` - GC frequency in seconds (default: 60)
    /// - `CACHE_REVALIDATION_INTERVAL` - Revalidation tick in seconds (default: 30)
    /// - `SERVER_PORT` - Admin API port (default: 3000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_size: env_or("CACHE_MAX_SIZE", defaults.max_size),
            gc_threshold: env_or("CACHE_GC_THRESHOLD", defaults.gc_threshold),
            default_ttl: env_or("CACHE_DEFAULT_TTL", defaults.default_ttl),
            gc_interval: env_or("CACHE_GC_INTERVAL", defaults.gc_interval),
            revalidation_interval: env_or(
                "CACHE_REVALIDATION_INTERVAL",
                defaults.revalidation_interval,
            ),
            server_port: env_or("SERVER_PORT", defaults.server_port),
        }
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_size: 1000,
            gc_threshold: 0.8,
            default_ttl: DEFAULT_TTL.as_secs(),
            gc_interval: 60,
            revalidation_interval: 30,
            server_port: 3000,
        }
    }
}
