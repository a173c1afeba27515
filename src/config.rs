//! Configuration Module
//!
//! Handles loading store configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::cache::StoreOptions;

/// Default database file, relative to the working directory.
pub const DEFAULT_DB_PATH: &str = "./scancache.db";

/// Store configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path of the SQLite database file
    pub db_path: PathBuf,
    /// Whether new entries are written compressed
    pub compression: bool,
    /// Gzip level, 0 (store) to 9 (best)
    pub compression_level: u32,
    /// How long a writer waits on a locked database, in milliseconds
    pub busy_timeout_ms: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SCANCACHE_DB_PATH` - Database file (default: ./scancache.db)
    /// - `SCANCACHE_COMPRESSION` - Compress new entries (default: true)
    /// - `SCANCACHE_COMPRESSION_LEVEL` - Gzip level 0-9 (default: 6)
    /// - `SCANCACHE_BUSY_TIMEOUT_MS` - Lock wait in ms (default: 5000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            db_path: env::var("SCANCACHE_DB_PATH")
                .ok()
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.db_path),
            compression: env::var("SCANCACHE_COMPRESSION")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.compression),
            compression_level: env::var("SCANCACHE_COMPRESSION_LEVEL")
                .ok()
                .and_then(|v| v.parse::<u32>().ok())
                .map(|level| level.min(9))
                .unwrap_or(defaults.compression_level),
            busy_timeout_ms: env::var("SCANCACHE_BUSY_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.busy_timeout_ms),
        }
    }

    /// Store tuning derived from this configuration.
    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            compression_level: self.compression_level,
            busy_timeout: Duration::from_millis(self.busy_timeout_ms),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            compression: true,
            compression_level: 6,
            busy_timeout_ms: 5000,
        }
    }
}
