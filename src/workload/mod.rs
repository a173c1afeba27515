//! Workload Module
//!
//! Inputs for driving a store: synthetic scan-report payloads and uniform
//! random sampling of stored keys.

mod payload;
mod sample;

pub use payload::{generate_payload, random_string, ScanReport, Secret, SetId};
pub use sample::{sample_keys, unique_random_ids};
