//! Store Statistics Module
//!
//! Point-in-time summary of what the store holds.

use serde::Serialize;

// == Store Stats ==
/// Aggregate view over all entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    /// Number of entries
    pub total_entries: u64,
    /// Entries whose value lives in the compressed column
    pub compressed_entries: u64,
    /// Sum of caller-declared sizes (not bytes on disk)
    pub declared_size: i64,
    /// Smallest ref_last, None when empty
    pub oldest_ref_last: Option<i64>,
    /// Largest ref_last, None when empty
    pub newest_ref_last: Option<i64>,
}

impl StoreStats {
    // == Plain Entries ==
    /// Entries stored as plain text.
    pub fn plain_entries(&self) -> u64 {
        self.total_entries.saturating_sub(self.compressed_entries)
    }

    // == Compression Ratio ==
    /// Fraction of entries stored compressed.
    ///
    /// Returns 0.0 for an empty store.
    pub fn compressed_ratio(&self) -> f64 {
        if self.total_entries == 0 {
            0.0
        } else {
            self.compressed_entries as f64 / self.total_entries as f64
        }
    }

    // == Span ==
    /// Seconds between the oldest and newest reference, None when empty.
    pub fn ref_last_span(&self) -> Option<i64> {
        match (self.oldest_ref_last, self.newest_ref_last) {
            (Some(oldest), Some(newest)) => Some(newest - oldest),
            _ => None,
        }
    }
}
