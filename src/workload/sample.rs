//! Uniform random sampling over the store's id space.

use rand::Rng;
use tracing::debug;

use crate::cache::CacheStore;
use crate::error::{CacheError, Result};

/// Picks up to `count` distinct ids from `1..=max_id`.
pub fn unique_random_ids<R: Rng + ?Sized>(rng: &mut R, max_id: i64, count: usize) -> Vec<i64> {
    if max_id < 1 {
        return Vec::new();
    }
    let span = max_id as usize;
    rand::seq::index::sample(rng, span, count.min(span))
        .into_iter()
        .map(|i| i as i64 + 1)
        .collect()
}

/// Resolves up to `count` random ids to keys.
///
/// Ids freed by deletes are skipped, so fewer keys may come back.
pub fn sample_keys<R: Rng + ?Sized>(
    store: &CacheStore,
    rng: &mut R,
    count: usize,
) -> Result<Vec<String>> {
    let Some(max_id) = store.max_id()? else {
        return Ok(Vec::new());
    };

    let mut keys = Vec::with_capacity(count);
    for id in unique_random_ids(rng, max_id, count) {
        match store.get_by_id(id) {
            Ok(meta) => keys.push(meta.key),
            Err(CacheError::NotFound(_)) => debug!(id, "Sampled id no longer exists"),
            Err(e) => return Err(e),
        }
    }
    Ok(keys)
}
