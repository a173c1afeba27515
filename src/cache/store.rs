//! Cache Store Module
//!
//! Persistent cache engine on SQLite: keyed CRUD, ref-count maintenance and
//! range purge over the `ref_last` index.

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use tracing::{debug, info, warn};

use crate::cache::codec::{Codec, StoredValue, DEFAULT_COMPRESSION_LEVEL};
use crate::cache::schema::{CACHE_SCHEMA, TABLE_NAME};
use crate::cache::{CacheEntry, EntryMeta, Payload, StoreStats};
use crate::error::{CacheError, CodecError, Result};

// == Store Options ==
/// Tuning applied when a store is created or opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreOptions {
    /// Gzip level for compressed entries
    pub compression_level: u32,
    /// Lock wait before a busy database reports failure
    pub busy_timeout: Duration,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            compression_level: DEFAULT_COMPRESSION_LEVEL,
            busy_timeout: Duration::from_secs(5),
        }
    }
}

/// Row as read back by key, before decoding.
struct RawRow {
    id: i64,
    key: String,
    valuet: Option<String>,
    valueb: Option<Vec<u8>>,
    size: i64,
    ref_count: u32,
    ref_last: i64,
    compressed: bool,
}

// == Cache Store ==
/// Handle to one cache database.
///
/// Every operation goes through an explicit handle, so several stores can be
/// open in one process.
#[derive(Debug)]
pub struct CacheStore {
    /// SQLite connection
    conn: Connection,
    /// Value encoder/decoder
    codec: Codec,
    /// Backing file, None for in-memory stores
    path: Option<PathBuf>,
}

impl CacheStore {
    // == Initialize ==
    /// Creates a fresh store at `path`, replacing any existing one.
    pub fn initialize(path: impl AsRef<Path>) -> Result<Self> {
        Self::initialize_with(path, StoreOptions::default())
    }

    /// Creates a fresh store at `path` with explicit options.
    ///
    /// The database file and its WAL sidecars are removed first.
    pub fn initialize_with(path: impl AsRef<Path>, options: StoreOptions) -> Result<Self> {
        let path = path.as_ref();
        let init_err = |reason: String| CacheError::StoreInit {
            path: path.to_path_buf(),
            reason,
        };

        for candidate in [
            path.to_path_buf(),
            sidecar(path, "-wal"),
            sidecar(path, "-shm"),
        ] {
            match fs::remove_file(&candidate) {
                Ok(()) => debug!("Removed existing {}", candidate.display()),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(init_err(format!(
                        "cannot remove {}: {}",
                        candidate.display(),
                        e
                    )))
                }
            }
        }

        let conn = Connection::open(path).map_err(|e| init_err(e.to_string()))?;
        conn.busy_timeout(options.busy_timeout)
            .map_err(|e| init_err(e.to_string()))?;
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
            row.get::<_, String>(0)
        })
        .map_err(|e| init_err(e.to_string()))?;
        conn.execute_batch(CACHE_SCHEMA)
            .map_err(|e| init_err(e.to_string()))?;

        info!("Initialized cache store at {}", path.display());

        Ok(Self {
            conn,
            codec: Codec::new(options.compression_level),
            path: Some(path.to_path_buf()),
        })
    }

    // == Open ==
    /// Attaches to an existing store without modifying it.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with(path, StoreOptions::default())
    }

    /// Attaches to an existing store with explicit options.
    pub fn open_with(path: impl AsRef<Path>, options: StoreOptions) -> Result<Self> {
        let path = path.as_ref();
        let not_found = |reason: String| CacheError::StoreNotFound {
            path: path.to_path_buf(),
            reason,
        };

        if !path.is_file() {
            return Err(not_found("no such file".to_string()));
        }

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| not_found(e.to_string()))?;
        conn.busy_timeout(options.busy_timeout)
            .map_err(|e| not_found(e.to_string()))?;

        // A foreign file fails here with "file is not a database"
        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
                [TABLE_NAME],
                |row| row.get(0),
            )
            .map_err(|e| not_found(e.to_string()))?;
        if tables == 0 {
            return Err(not_found(format!("missing '{}' table", TABLE_NAME)));
        }

        info!("Opened cache store at {}", path.display());

        Ok(Self {
            conn,
            codec: Codec::new(options.compression_level),
            path: Some(path.to_path_buf()),
        })
    }

    // == In-Memory ==
    /// Creates a throwaway in-memory store (for testing).
    pub fn memory() -> Result<Self> {
        let init_err = |e: rusqlite::Error| CacheError::StoreInit {
            path: PathBuf::from(":memory:"),
            reason: e.to_string(),
        };
        let conn = Connection::open_in_memory().map_err(init_err)?;
        conn.execute_batch(CACHE_SCHEMA).map_err(init_err)?;

        Ok(Self {
            conn,
            codec: Codec::default(),
            path: None,
        })
    }

    /// Backing file of this store, None when in-memory.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    // == Put ==
    /// Inserts an entry, or updates it in place if the key already exists.
    ///
    /// Returns the entry's id.
    pub fn put(&mut self, entry: &CacheEntry) -> Result<i64> {
        let stored = self.encode_entry(entry)?;
        let (valuet, valueb) = columns(&stored);

        let tx = self.conn.transaction()?;
        let inserted = tx.execute(
            "INSERT INTO cache (key, valuet, valueb, size, ref_cnt, ref_last) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![entry.key, valuet, valueb, entry.size, entry.ref_count, entry.ref_last],
        );

        let id = match inserted {
            Ok(_) => {
                let id = tx.last_insert_rowid();
                debug!(key = %entry.key, id, "Inserted entry");
                id
            }
            Err(e) if is_unique_violation(&e) => {
                debug!(key = %entry.key, "Key exists, updating in place");
                update_in(&tx, entry, &stored)?
            }
            Err(e) => return Err(e.into()),
        };

        tx.commit()?;
        Ok(id)
    }

    // == Get By Key ==
    /// Retrieves an entry with its value.
    ///
    /// `compressed` selects the value column and decode path. A value that
    /// fails to decode comes back as [`Payload::Unreadable`] instead of an
    /// error, so the metadata stays available. The returned entry reports
    /// the stored mode, whatever flag was passed.
    pub fn get_by_key(&self, key: &str, compressed: bool) -> Result<CacheEntry> {
        let raw = self
            .conn
            .query_row(
                "SELECT id, key, valuet, valueb, size, ref_cnt, ref_last, valueb IS NOT NULL FROM cache WHERE key = ?1",
                [key],
                |row| {
                    Ok(RawRow {
                        id: row.get(0)?,
                        key: row.get(1)?,
                        valuet: row.get(2)?,
                        valueb: row.get(3)?,
                        size: row.get(4)?,
                        ref_count: row.get(5)?,
                        ref_last: row.get(6)?,
                        compressed: row.get(7)?,
                    })
                },
            )
            .optional()
            .map_err(read_err)?
            .ok_or_else(|| CacheError::NotFound(key.to_string()))?;

        let stored = if compressed {
            raw.valueb.map(StoredValue::Compressed)
        } else {
            raw.valuet.map(StoredValue::Plain)
        };
        let decoded = stored
            .ok_or(CodecError::ModeMismatch {
                expected: if compressed { "compressed" } else { "plain" },
            })
            .and_then(|s| self.codec.decode(&s, compressed));

        let value = match decoded {
            Ok(text) => Payload::Text(text),
            Err(e) => {
                warn!(key = %raw.key, error = %e, "Payload unreadable");
                Payload::Unreadable
            }
        };

        Ok(CacheEntry {
            id: raw.id,
            key: raw.key,
            value,
            size: raw.size,
            ref_count: raw.ref_count,
            ref_last: raw.ref_last,
            compressed: raw.compressed,
        })
    }

    // == Get By Id ==
    /// Retrieves metadata by surrogate id, without the value.
    pub fn get_by_id(&self, id: i64) -> Result<EntryMeta> {
        self.conn
            .query_row(
                "SELECT id, key, size, ref_cnt, ref_last FROM cache WHERE id = ?1",
                [id],
                |row| {
                    Ok(EntryMeta {
                        id: row.get(0)?,
                        key: row.get(1)?,
                        size: row.get(2)?,
                        ref_count: row.get(3)?,
                        ref_last: row.get(4)?,
                    })
                },
            )
            .optional()
            .map_err(read_err)?
            .ok_or_else(|| CacheError::NotFound(format!("id {}", id)))
    }

    // == Update ==
    /// Replaces value, size, ref_count and ref_last of an existing key.
    ///
    /// The entry's compression mode must match the stored one.
    pub fn update(&mut self, entry: &CacheEntry) -> Result<()> {
        let stored = self.encode_entry(entry)?;

        let tx = self.conn.transaction()?;
        update_in(&tx, entry, &stored)?;
        tx.commit()?;

        debug!(key = %entry.key, "Updated entry");
        Ok(())
    }

    // == Update Ref Count ==
    /// Sets ref_count by id. ref_last and the value are left alone.
    pub fn update_ref_count(&mut self, id: i64, ref_count: u32) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE cache SET ref_cnt = ?1 WHERE id = ?2",
            params![ref_count, id],
        )?;
        if changed == 0 {
            return Err(CacheError::NotFound(format!("id {}", id)));
        }
        Ok(())
    }

    // == Increment Ref Count ==
    /// Atomically bumps ref_count by one and returns the new count.
    ///
    /// A count already at `u32::MAX` is left unchanged and reported as
    /// [`CacheError::RefCountSaturated`].
    pub fn increment_ref_count(&mut self, key: &str) -> Result<u32> {
        let tx = self.conn.transaction()?;
        let bumped: Option<u32> = tx
            .query_row(
                "UPDATE cache SET ref_cnt = ref_cnt + 1 WHERE key = ?1 AND ref_cnt < ?2 RETURNING ref_cnt",
                params![key, u32::MAX],
                |row| row.get(0),
            )
            .optional()?;

        let Some(ref_count) = bumped else {
            let exists = tx
                .query_row("SELECT 1 FROM cache WHERE key = ?1", [key], |_| Ok(()))
                .optional()?
                .is_some();
            return Err(if exists {
                CacheError::RefCountSaturated(key.to_string())
            } else {
                CacheError::NotFound(key.to_string())
            });
        };

        tx.commit()?;
        Ok(ref_count)
    }

    // == Delete ==
    /// Removes the entry with `key`.
    ///
    /// Returns whether a row was removed; an absent key is not an error.
    pub fn delete_by_key(&mut self, key: &str) -> Result<bool> {
        let removed = self.conn.execute("DELETE FROM cache WHERE key = ?1", [key])?;
        Ok(removed > 0)
    }

    // == Purge Range ==
    /// Deletes every entry with `start <= ref_last <= end` in one statement.
    ///
    /// Returns the number of deleted entries. An inverted range matches nothing.
    pub fn purge_range(&mut self, ref_last_start: i64, ref_last_end: i64) -> Result<usize> {
        if ref_last_start > ref_last_end {
            return Ok(0);
        }

        let removed = self.conn.execute(
            "DELETE FROM cache WHERE ref_last >= ?1 AND ref_last <= ?2",
            params![ref_last_start, ref_last_end],
        )?;

        info!(
            "Purged {} entries with ref_last in [{}, {}]",
            removed, ref_last_start, ref_last_end
        );
        Ok(removed)
    }

    // == Count ==
    /// Returns the number of entries.
    pub fn count(&self) -> Result<u64> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM cache", [], |row| row.get(0))
            .map_err(read_err)?;
        Ok(n as u64)
    }

    // == Max Id ==
    /// Highest id currently stored, None when empty.
    pub fn max_id(&self) -> Result<Option<i64>> {
        self.conn
            .query_row("SELECT MAX(id) FROM cache", [], |row| row.get(0))
            .map_err(read_err)
    }

    // == Stats ==
    /// Returns an aggregate snapshot of the store.
    pub fn stats(&self) -> Result<StoreStats> {
        self.conn
            .query_row(
                "SELECT COUNT(*), COALESCE(SUM(valueb IS NOT NULL), 0), COALESCE(SUM(size), 0), MIN(ref_last), MAX(ref_last) FROM cache",
                [],
                |row| {
                    Ok(StoreStats {
                        total_entries: row.get::<_, i64>(0)? as u64,
                        compressed_entries: row.get::<_, i64>(1)? as u64,
                        declared_size: row.get(2)?,
                        oldest_ref_last: row.get(3)?,
                        newest_ref_last: row.get(4)?,
                    })
                },
            )
            .map_err(read_err)
    }

    fn encode_entry(&self, entry: &CacheEntry) -> Result<StoredValue> {
        let text = entry.value.as_text().ok_or_else(|| {
            CacheError::InvalidRequest(format!(
                "entry {} carries an unreadable payload",
                entry.key
            ))
        })?;
        Ok(self.codec.encode(text, entry.compressed)?)
    }
}

/// Update by key inside an open transaction; returns the entry's id.
fn update_in(conn: &Connection, entry: &CacheEntry, stored: &StoredValue) -> Result<i64> {
    let existing: Option<(i64, bool)> = conn
        .query_row(
            "SELECT id, valueb IS NOT NULL FROM cache WHERE key = ?1",
            [&entry.key],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;
    let (id, stored_compressed) =
        existing.ok_or_else(|| CacheError::NotFound(entry.key.clone()))?;

    if stored_compressed != entry.compressed {
        return Err(CacheError::CompressionMismatch {
            key: entry.key.clone(),
            stored: stored_compressed,
        });
    }

    let (valuet, valueb) = columns(stored);
    conn.execute(
        "UPDATE cache SET valuet = ?1, valueb = ?2, size = ?3, ref_cnt = ?4, ref_last = ?5 WHERE id = ?6",
        params![valuet, valueb, entry.size, entry.ref_count, entry.ref_last, id],
    )?;
    Ok(id)
}

/// Splits a stored value into its (text, blob) columns; exactly one is set.
fn columns(stored: &StoredValue) -> (Option<&str>, Option<&[u8]>) {
    match stored {
        StoredValue::Plain(s) => (Some(s.as_str()), None),
        StoredValue::Compressed(b) => (None, Some(b.as_slice())),
    }
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

fn read_err(e: rusqlite::Error) -> CacheError {
    CacheError::StoreRead(e.to_string())
}

fn sidecar(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}
