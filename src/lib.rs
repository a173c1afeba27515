//! Scancache - A persistent content-addressed cache store
//!
//! Entries are keyed by a SHA-256 digest of their payload, carry a reference
//! count and last-reference time, and can be stored gzip-compressed.
//! Eviction is an explicit range purge over the last-reference time.

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod workload;

pub use cache::{derive_key, CacheEntry, CacheStore, Payload};
pub use config::Config;
pub use error::{CacheError, Result};
