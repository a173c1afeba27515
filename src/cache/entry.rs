//! Cache Entry Module
//!
//! Defines the persisted entry, its payload state and the id-lookup metadata.

use chrono::Utc;
use serde::Serialize;

// == Payload ==
/// Logical value of an entry as seen by callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// Readable value
    Text(String),
    /// Stored blob could not be decoded; metadata is still valid
    Unreadable,
}

impl Payload {
    /// Returns the text, or None when the stored blob was unreadable.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Payload::Text(s) => Some(s),
            Payload::Unreadable => None,
        }
    }

    /// Returns true if the payload failed to decode.
    pub fn is_unreadable(&self) -> bool {
        matches!(self, Payload::Unreadable)
    }

    /// Byte length of the readable text, 0 when unreadable.
    pub fn len(&self) -> usize {
        self.as_text().map_or(0, str::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<String> for Payload {
    fn from(s: String) -> Self {
        Payload::Text(s)
    }
}

impl From<&str> for Payload {
    fn from(s: &str) -> Self {
        Payload::Text(s.to_string())
    }
}

// == Cache Entry ==
/// A single stored record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// Store-assigned surrogate id, 0 until persisted
    pub id: i64,
    /// Unique key, normally a content digest
    pub key: String,
    /// The stored value
    pub value: Payload,
    /// Caller-declared logical size
    pub size: i64,
    /// Usage counter maintained by callers
    pub ref_count: u32,
    /// Last reference time (Unix seconds), the purge key
    pub ref_last: i64,
    /// Storage mode, fixed once the entry exists
    pub compressed: bool,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates an unsaved entry.
    ///
    /// # Arguments
    /// * `key` - Unique key for the entry
    /// * `value` - Text payload
    /// * `size` - Declared logical size
    /// * `ref_count` - Initial usage count
    /// * `ref_last` - Timestamp in Unix seconds
    /// * `compressed` - Whether the value is stored gzip-compressed
    pub fn new(
        key: impl Into<String>,
        value: impl Into<String>,
        size: i64,
        ref_count: u32,
        ref_last: i64,
        compressed: bool,
    ) -> Self {
        Self {
            id: 0,
            key: key.into(),
            value: Payload::Text(value.into()),
            size,
            ref_count,
            ref_last,
            compressed,
        }
    }
}

// == Entry Metadata ==
/// Id-lookup result; never carries the payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryMeta {
    pub id: i64,
    pub key: String,
    pub size: i64,
    pub ref_count: u32,
    pub ref_last: i64,
}

// == Utility Functions ==
/// Returns current Unix timestamp in seconds.
pub fn current_timestamp_secs() -> i64 {
    Utc::now().timestamp()
}
