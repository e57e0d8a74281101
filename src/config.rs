//! Configuration Module
//!
//! Loads server configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::engine::MemoryConfig;
use crate::policy::PolicyConfig;

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum number of entries the memory engine can hold
    pub max_entries: usize,
    /// Maximum total size of stored items in bytes
    pub max_byte_size: usize,
    /// Default TTL in milliseconds for items stored without an explicit TTL
    pub default_ttl_ms: u64,
    /// Segment the server's policy is bound to
    pub segment: String,
    /// HTTP server port
    pub server_port: u16,
    /// Background cleanup task interval in seconds
    pub cleanup_interval: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `MAX_ENTRIES` - Maximum cache entries (default: 1000)
    /// - `MAX_BYTE_SIZE` - Maximum stored bytes (default: 104857600)
    /// - `DEFAULT_TTL_MS` - Default TTL in milliseconds (default: 300000)
    /// - `SEGMENT` - Segment name (default: "default")
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `CLEANUP_INTERVAL` - Cleanup frequency in seconds (default: 1)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_entries: env_or("MAX_ENTRIES", defaults.max_entries),
            max_byte_size: env_or("MAX_BYTE_SIZE", defaults.max_byte_size),
            default_ttl_ms: env_or("DEFAULT_TTL_MS", defaults.default_ttl_ms),
            segment: env::var("SEGMENT").unwrap_or(defaults.segment),
            server_port: env_or("SERVER_PORT", defaults.server_port),
            cleanup_interval: env_or("CLEANUP_INTERVAL", defaults.cleanup_interval),
        }
    }

    /// Memory engine settings derived from this configuration.
    pub fn memory(&self) -> MemoryConfig {
        MemoryConfig {
            max_entries: self.max_entries,
            max_byte_size: self.max_byte_size,
            cleanup_interval: Duration::from_secs(self.cleanup_interval),
        }
    }

    /// Policy rule derived from this configuration.
    pub fn policy(&self) -> PolicyConfig {
        PolicyConfig::expires_in(Duration::from_millis(self.default_ttl_ms))
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
            max_entries: 1000,
            max_byte_size: 100 * 1024 * 1024,
            default_ttl_ms: 300_000,
            segment: "default".to_string(),
            server_port: 3000,
            cleanup_interval: 1,
        }
    }
}
