//! Key Derivation Module
//!
//! Content-addressed keys: SHA-256 of the payload bytes, lowercase hex.

use sha2::{Digest, Sha256};

/// Length of a derived key in characters.
pub const KEY_HEX_LEN: usize = 64;

/// Derives the store key for a payload.
///
/// Deterministic and free of process state: equal payloads give equal keys.
pub fn derive_key(payload: impl AsRef<[u8]>) -> String {
    let digest = Sha256::digest(payload.as_ref());
    hex::encode(digest)
}
