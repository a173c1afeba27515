//! Codec Module
//!
//! Converts entry values to their stored form and back. Plain values pass
//! through untouched; compressed values are serialized to JSON and gzipped.

use std::io::{Read, Write};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

use crate::error::CodecError;

/// Default gzip level.
pub const DEFAULT_COMPRESSION_LEVEL: u32 = 6;

// == Stored Value ==
/// A value in the form it occupies in the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoredValue {
    /// Text column
    Plain(String),
    /// Blob column
    Compressed(Vec<u8>),
}

impl StoredValue {
    pub fn is_compressed(&self) -> bool {
        matches!(self, StoredValue::Compressed(_))
    }
}

// == Codec ==
/// Encoder/decoder for stored values.
#[derive(Debug, Clone, Copy)]
pub struct Codec {
    level: Compression,
}

impl Codec {
    /// Creates a codec with the given gzip level (clamped to 0..=9).
    pub fn new(level: u32) -> Self {
        Self {
            level: Compression::new(level.min(9)),
        }
    }

    // == Encode ==
    /// Produces the stored form of `value`.
    ///
    /// With `want_compressed` unset the value is returned as-is.
    pub fn encode(&self, value: &str, want_compressed: bool) -> Result<StoredValue, CodecError> {
        if !want_compressed {
            return Ok(StoredValue::Plain(value.to_string()));
        }

        let serialized = serde_json::to_vec(value).map_err(CodecError::Serialize)?;
        let mut encoder = GzEncoder::new(Vec::new(), self.level);
        encoder
            .write_all(&serialized)
            .map_err(CodecError::Compress)?;
        let compressed = encoder.finish().map_err(CodecError::Compress)?;

        Ok(StoredValue::Compressed(compressed))
    }

    // == Decode ==
    /// Inverse of [`Codec::encode`].
    ///
    /// `is_compressed` must match the stored form. Any failure is reported as
    /// an error; partially decoded data is never returned.
    pub fn decode(&self, stored: &StoredValue, is_compressed: bool) -> Result<String, CodecError> {
        match (stored, is_compressed) {
            (StoredValue::Plain(s), false) => Ok(s.clone()),
            (StoredValue::Compressed(bytes), true) => {
                let mut decoder = GzDecoder::new(bytes.as_slice());
                let mut raw = Vec::new();
                decoder
                    .read_to_end(&mut raw)
                    .map_err(CodecError::Decompress)?;
                serde_json::from_slice::<String>(&raw).map_err(CodecError::Deserialize)
            }
            (_, true) => Err(CodecError::ModeMismatch {
                expected: "compressed",
            }),
            (_, false) => Err(CodecError::ModeMismatch { expected: "plain" }),
        }
    }
}

impl Default for Codec {
    fn default() -> Self {
        Self::new(DEFAULT_COMPRESSION_LEVEL)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_passthrough() {
        let codec = Codec::default();
        let stored = codec.encode("hello", false).unwrap();

        assert_eq!(stored, StoredValue::Plain("hello".to_string()));
        assert_eq!(codec.decode(&stored, false).unwrap(), "hello");
    }

    #[test]
    fn test_compressed_roundtrip() {
        let codec = Codec::default();
        let value = "abc".repeat(400);
        let stored = codec.encode(&value, true).unwrap();

        assert!(stored.is_compressed());
        assert_eq!(codec.decode(&stored, true).unwrap(), value);
    }

    #[test]
    fn test_compression_shrinks_repetitive_input() {
        let codec = Codec::new(9);
        let value = "x".repeat(10_000);

        match codec.encode(&value, true).unwrap() {
            StoredValue::Compressed(bytes) => assert!(bytes.len() < 1_000),
            other => panic!("expected compressed, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_value_compressed_roundtrip() {
        let codec = Codec::default();
        let stored = codec.encode("", true).unwrap();
        assert_eq!(codec.decode(&stored, true).unwrap(), "");
    }

    #[test]
    fn test_decode_garbage_fails() {
        let codec = Codec::default();
        let stored = StoredValue::Compressed(vec![0xde, 0xad, 0xbe, 0xef]);

        assert!(matches!(
            codec.decode(&stored, true),
            Err(CodecError::Decompress(_))
        ));
    }

    #[test]
    fn test_decode_valid_gzip_invalid_payload_fails() {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"not json").unwrap();
        let stored = StoredValue::Compressed(encoder.finish().unwrap());

        assert!(matches!(
            Codec::default().decode(&stored, true),
            Err(CodecError::Deserialize(_))
        ));
    }

    #[test]
    fn test_decode_mode_mismatch() {
        let codec = Codec::default();
        let plain = StoredValue::Plain("x".to_string());

        assert!(matches!(
            codec.decode(&plain, true),
            Err(CodecError::ModeMismatch { .. })
        ));
    }
}
