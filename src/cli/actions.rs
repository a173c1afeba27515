//! Timed actions run by the driver.

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::{TimeZone, Utc};
use rand::Rng;
use tracing::{debug, info, warn};

use crate::cache::{current_timestamp_secs, derive_key, CacheEntry, CacheStore, StoreStats};
use crate::cli::{Cli, Command, PurgeArgs};
use crate::config::Config;
use crate::workload::{generate_payload, sample_keys};

/// Progress is logged once per this many items.
const PROGRESS_EVERY: usize = 1000;

// == Action Report ==
/// Outcome of one timed action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionReport {
    pub action: &'static str,
    /// Items the action attempted
    pub attempted: usize,
    /// Items that took effect (found, deleted, purged...)
    pub affected: usize,
    pub elapsed: Duration,
}

impl ActionReport {
    /// Mean time per attempted item.
    pub fn average(&self) -> Duration {
        match u32::try_from(self.attempted) {
            Ok(0) | Err(_) => Duration::ZERO,
            Ok(n) => self.elapsed / n,
        }
    }

    fn log(&self) {
        info!(
            "Done. {}: {}/{} affected, total_time={:?}, average={:?}",
            self.action,
            self.affected,
            self.attempted,
            self.elapsed,
            self.average()
        );
    }
}

/// Inclusive ref_last range for a purge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PurgeBounds {
    pub start: i64,
    pub end: i64,
}

impl PurgeBounds {
    /// Resolves CLI arguments against `now` (Unix seconds).
    pub fn resolve(args: &PurgeArgs, now: i64) -> Option<Self> {
        match (args.start, args.end, args.older_than) {
            (Some(start), Some(end), None) => Some(Self { start, end }),
            (None, None, Some(age)) => Some(Self {
                start: i64::MIN,
                end: now.saturating_sub(i64::try_from(age).unwrap_or(i64::MAX)),
            }),
            _ => None,
        }
    }
}

// == Dispatch ==
/// Runs the parsed command with the merged configuration.
pub fn run(cli: &Cli, config: &Config) -> Result<()> {
    let mut rng = rand::thread_rng();

    match &cli.command {
        Command::Create { count } => {
            let mut store = CacheStore::initialize_with(&config.db_path, config.store_options())
                .context("initialize store")?;
            create(&mut store, &mut rng, *count, config.compression)?.log();
        }
        Command::Read { count } => {
            let store = open_store(config)?;
            read(&store, &mut rng, *count, config.compression)?.log();
        }
        Command::Update { count } => {
            let mut store = open_store(config)?;
            update(&mut store, &mut rng, *count)?.log();
        }
        Command::Delete { count } => {
            let mut store = open_store(config)?;
            delete(&mut store, &mut rng, *count)?.log();
        }
        Command::Search { key } => {
            let store = open_store(config)?;
            search(&store, key, config.compression)?;
        }
        Command::Purge(args) => {
            let bounds = PurgeBounds::resolve(args, current_timestamp_secs())
                .context("purge needs --start/--end or --older-than")?;
            let mut store = open_store(config)?;
            purge(&mut store, bounds)?.log();
        }
        Command::Stats => {
            let store = open_store(config)?;
            let stats = stats(&store)?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
    }
    Ok(())
}

fn open_store(config: &Config) -> Result<CacheStore> {
    CacheStore::open_with(&config.db_path, config.store_options())
        .with_context(|| format!("open store {}", config.db_path.display()))
}

// == Create ==
/// Inserts `count` generated payloads keyed by their digest.
pub fn create<R: Rng + ?Sized>(
    store: &mut CacheStore,
    rng: &mut R,
    count: usize,
    compressed: bool,
) -> Result<ActionReport> {
    info!("Create {} records (compressed={})", count, compressed);
    let started = Instant::now();

    for i in 0..count {
        let payload = generate_payload(rng).context("render payload")?;
        let key = derive_key(&payload);
        let size = payload.len() as i64;
        let entry = CacheEntry::new(key, payload, size, 1, current_timestamp_secs(), compressed);

        let put_started = Instant::now();
        store
            .put(&entry)
            .with_context(|| format!("put {}", entry.key))?;

        if i % PROGRESS_EVERY == 0 {
            info!("\t{}/{}.., took {:?}", i, count, put_started.elapsed());
        }
    }

    Ok(ActionReport {
        action: "create",
        attempted: count,
        affected: count,
        elapsed: started.elapsed(),
    })
}

// == Read ==
/// Reads `count` randomly sampled keys.
pub fn read<R: Rng + ?Sized>(
    store: &CacheStore,
    rng: &mut R,
    count: usize,
    compressed: bool,
) -> Result<ActionReport> {
    let keys = sample_keys(store, rng, count).context("sample keys")?;
    info!("Random read of {} keys", keys.len());
    let started = Instant::now();

    let mut readable = 0;
    for (i, key) in keys.iter().enumerate() {
        let entry = store
            .get_by_key(key, compressed)
            .with_context(|| format!("fetch {}", key))?;
        if entry.value.is_unreadable() {
            warn!(key = %key, "Value could not be decoded");
        } else {
            readable += 1;
        }
        debug!(
            "[{}] fetch key={}, ref_count={}, value_length={}",
            i,
            key,
            entry.ref_count,
            entry.value.len()
        );
    }

    Ok(ActionReport {
        action: "read",
        attempted: keys.len(),
        affected: readable,
        elapsed: started.elapsed(),
    })
}

// == Update ==
/// Atomically bumps ref_count of `count` randomly sampled keys.
pub fn update<R: Rng + ?Sized>(
    store: &mut CacheStore,
    rng: &mut R,
    count: usize,
) -> Result<ActionReport> {
    let keys = sample_keys(store, rng, count).context("sample keys")?;
    info!("Random ref_count update of {} keys", keys.len());
    let started = Instant::now();

    for (i, key) in keys.iter().enumerate() {
        let ref_count = store
            .increment_ref_count(key)
            .with_context(|| format!("increment {}", key))?;
        if i % 100 == 0 {
            debug!("[{}] key={}, ref_count={}", i, key, ref_count);
        }
    }

    Ok(ActionReport {
        action: "update",
        attempted: keys.len(),
        affected: keys.len(),
        elapsed: started.elapsed(),
    })
}

// == Delete ==
/// Deletes `count` randomly sampled keys.
pub fn delete<R: Rng + ?Sized>(
    store: &mut CacheStore,
    rng: &mut R,
    count: usize,
) -> Result<ActionReport> {
    let keys = sample_keys(store, rng, count).context("sample keys")?;
    info!("Random delete of {} keys", keys.len());
    let started = Instant::now();

    let mut removed = 0;
    for key in &keys {
        if store
            .delete_by_key(key)
            .with_context(|| format!("delete {}", key))?
        {
            removed += 1;
        }
    }

    Ok(ActionReport {
        action: "delete",
        attempted: keys.len(),
        affected: removed,
        elapsed: started.elapsed(),
    })
}

// == Search ==
/// Looks up one key and logs what was found.
pub fn search(store: &CacheStore, key: &str, compressed: bool) -> Result<CacheEntry> {
    let started = Instant::now();
    let entry = store
        .get_by_key(key, compressed)
        .with_context(|| format!("fetch {}", key))?;

    let last_seen = Utc
        .timestamp_opt(entry.ref_last, 0)
        .single()
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| entry.ref_last.to_string());
    info!(
        "fetch key={}, ref_count={}, ref_last={}, value_length={}, unreadable={}, time={:?}",
        key,
        entry.ref_count,
        last_seen,
        entry.value.len(),
        entry.value.is_unreadable(),
        started.elapsed()
    );
    Ok(entry)
}

// == Purge ==
/// Deletes all entries with ref_last inside `bounds`.
pub fn purge(store: &mut CacheStore, bounds: PurgeBounds) -> Result<ActionReport> {
    let started = Instant::now();
    let removed = store
        .purge_range(bounds.start, bounds.end)
        .context("purge ref_last range")?;

    Ok(ActionReport {
        action: "purge",
        attempted: removed,
        affected: removed,
        elapsed: started.elapsed(),
    })
}

// == Stats ==
pub fn stats(store: &CacheStore) -> Result<StoreStats> {
    store.stats().context("collect stats")
}
