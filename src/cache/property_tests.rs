//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check store and codec behaviour over generated inputs.

use proptest::prelude::*;
use std::collections::HashMap;

use crate::cache::{CacheEntry, CacheStore, Codec, Payload};
use crate::error::CacheError;

// == Strategies ==
/// Generates valid cache keys
fn valid_key_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_]{1,64}".prop_map(|s| s)
}

/// Generates printable text values, including non-ASCII
fn value_strategy() -> impl Strategy<Value = String> {
    "\\PC{0,256}".prop_map(|s| s)
}

/// Generates ref_last timestamps in a narrow window so ranges overlap
fn ref_last_strategy() -> impl Strategy<Value = i64> {
    0i64..1_000
}

#[derive(Debug, Clone)]
enum StoreOp {
    Put { key: String, ref_last: i64 },
    Delete { key: String },
}

/// Small key space so puts and deletes collide
fn store_op_strategy() -> impl Strategy<Value = StoreOp> {
    let key = "k[0-9]";
    prop_oneof![
        (key, ref_last_strategy()).prop_map(|(key, ref_last)| StoreOp::Put { key, ref_last }),
        key.prop_map(|key| StoreOp::Delete { key }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // Repeated puts under one key leave exactly one entry holding the last value.
    #[test]
    fn prop_key_uniqueness(
        key in valid_key_strategy(),
        values in prop::collection::vec(value_strategy(), 1..10),
        compressed in any::<bool>()
    ) {
        let mut store = CacheStore::memory().unwrap();

        for (i, value) in values.iter().enumerate() {
            let entry = CacheEntry::new(key.clone(), value.clone(), 1, 1, i as i64, compressed);
            store.put(&entry).unwrap();
        }

        prop_assert_eq!(store.count().unwrap(), 1);
        let got = store.get_by_key(&key, compressed).unwrap();
        prop_assert_eq!(got.value, Payload::Text(values.last().unwrap().clone()));
    }

    // decode(encode(v, m), m) == v for both modes.
    #[test]
    fn prop_codec_roundtrip(value in value_strategy(), level in 0u32..=9) {
        let codec = Codec::new(level);

        for mode in [true, false] {
            let stored = codec.encode(&value, mode).unwrap();
            prop_assert_eq!(stored.is_compressed(), mode);
            prop_assert_eq!(codec.decode(&stored, mode).unwrap(), value.clone());
        }
    }

    // update_ref_count never alters ref_last or value.
    #[test]
    fn prop_ref_count_isolation(
        key in valid_key_strategy(),
        value in value_strategy(),
        ref_last in ref_last_strategy(),
        new_count in any::<u32>(),
        compressed in any::<bool>()
    ) {
        let mut store = CacheStore::memory().unwrap();
        let id = store
            .put(&CacheEntry::new(key.clone(), value.clone(), 3, 1, ref_last, compressed))
            .unwrap();

        store.update_ref_count(id, new_count).unwrap();

        let got = store.get_by_key(&key, compressed).unwrap();
        prop_assert_eq!(got.ref_count, new_count);
        prop_assert_eq!(got.ref_last, ref_last);
        prop_assert_eq!(got.value, Payload::Text(value));
        prop_assert_eq!(got.size, 3);
    }

    // After purge_range(a, b) nothing in [a, b] remains and everything else is untouched.
    #[test]
    fn prop_range_purge_correctness(
        stamps in prop::collection::vec(ref_last_strategy(), 0..40),
        a in ref_last_strategy(),
        b in ref_last_strategy()
    ) {
        let mut store = CacheStore::memory().unwrap();
        for (i, ts) in stamps.iter().enumerate() {
            store
                .put(&CacheEntry::new(format!("k{}", i), format!("v{}", i), i as i64, 1, *ts, i % 2 == 0))
                .unwrap();
        }

        let mut before = HashMap::new();
        for i in 0..stamps.len() {
            let key = format!("k{}", i);
            before.insert(key.clone(), store.get_by_key(&key, i % 2 == 0).unwrap());
        }

        let expected_removed = if a <= b {
            stamps.iter().filter(|ts| (a..=b).contains(*ts)).count()
        } else {
            0
        };
        let removed = store.purge_range(a, b).unwrap();
        prop_assert_eq!(removed, expected_removed);

        for (i, ts) in stamps.iter().enumerate() {
            let key = format!("k{}", i);
            let after = store.get_by_key(&key, i % 2 == 0);
            if a <= b && (a..=b).contains(ts) {
                prop_assert!(matches!(after, Err(CacheError::NotFound(_))));
            } else {
                prop_assert_eq!(&after.unwrap(), &before[&key]);
            }
        }
    }

    // count() matches the number of ids that resolve via get_by_id.
    #[test]
    fn prop_count_consistency(ops in prop::collection::vec(store_op_strategy(), 1..60)) {
        let mut store = CacheStore::memory().unwrap();

        for op in ops {
            match op {
                StoreOp::Put { key, ref_last } => {
                    store.put(&CacheEntry::new(key, "v", 1, 1, ref_last, false)).unwrap();
                }
                StoreOp::Delete { key } => {
                    store.delete_by_key(&key).unwrap();
                }
            }
        }

        let max_id = store.max_id().unwrap().unwrap_or(0);
        let live = (1..=max_id).filter(|id| store.get_by_id(*id).is_ok()).count() as u64;
        prop_assert_eq!(store.count().unwrap(), live);
    }
}
