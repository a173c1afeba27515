//! Error types for the cache store
//!
//! Provides unified error handling using thiserror.

use std::path::PathBuf;

use thiserror::Error;

// == Codec Error Enum ==
/// Failures raised while encoding or decoding a stored value.
#[derive(Error, Debug)]
pub enum CodecError {
    /// Value could not be serialized before compression
    #[error("Serialize failed: {0}")]
    Serialize(#[source] serde_json::Error),

    /// Gzip stream could not be written
    #[error("Compress failed: {0}")]
    Compress(#[source] std::io::Error),

    /// Gzip stream is truncated or not gzip at all
    #[error("Decompress failed: {0}")]
    Decompress(#[source] std::io::Error),

    /// Decompressed bytes are not a serialized value
    #[error("Deserialize failed: {0}")]
    Deserialize(#[source] serde_json::Error),

    /// Stored representation does not match the requested mode
    #[error("Value not stored in {expected} form")]
    ModeMismatch { expected: &'static str },
}

// == Cache Error Enum ==
/// Unified error type for the cache store.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Backing file could not be created or replaced
    #[error("Cannot initialize store at {path}: {reason}")]
    StoreInit { path: PathBuf, reason: String },

    /// Open was attempted against a missing or foreign file
    #[error("No cache store at {path}: {reason}")]
    StoreNotFound { path: PathBuf, reason: String },

    /// Key or id not present
    #[error("Entry not found: {0}")]
    NotFound(String),

    /// ref_count is already at its maximum
    #[error("Ref count saturated: {0}")]
    RefCountSaturated(String),

    /// Underlying I/O failed during a mutating call
    #[error("Store write failed: {0}")]
    StoreWrite(String),

    /// Underlying I/O failed during a lookup
    #[error("Store read failed: {0}")]
    StoreRead(String),

    /// Encoding a value for storage failed
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    /// Caller supplied an entry that cannot be written
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Update would change an entry's compression mode
    #[error("Compression mode of {key} is fixed (stored compressed={stored})")]
    CompressionMismatch { key: String, stored: bool },
}

impl From<rusqlite::Error> for CacheError {
    fn from(e: rusqlite::Error) -> Self {
        CacheError::StoreWrite(e.to_string())
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache store.
pub type Result<T> = std::result::Result<T, CacheError>;
