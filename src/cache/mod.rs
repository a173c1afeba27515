//! Cache Module
//!
//! Persistent content-addressed cache: entries, codec, key derivation and the
//! SQLite-backed store.

mod codec;
mod entry;
mod key;
mod schema;
mod stats;
mod store;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use codec::{Codec, StoredValue, DEFAULT_COMPRESSION_LEVEL};
pub use entry::{current_timestamp_secs, CacheEntry, EntryMeta, Payload};
pub use key::{derive_key, KEY_HEX_LEN};
pub use schema::{CACHE_SCHEMA, TABLE_NAME};
pub use stats::StoreStats;
pub use store::{CacheStore, StoreOptions};
