//! Schema for the entries table.

/// Name of the entries table.
pub const TABLE_NAME: &str = "cache";

/// DDL applied by `CacheStore::initialize`.
///
/// AUTOINCREMENT keeps ids from being reused after the highest row is deleted.
pub const CACHE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS cache (
    id       INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT,
    key      TEXT NOT NULL UNIQUE,
    valuet   TEXT,
    valueb   BLOB,
    size     INTEGER NOT NULL DEFAULT 0,
    ref_cnt  INTEGER NOT NULL DEFAULT 0,
    ref_last INTEGER NOT NULL DEFAULT 0
);
CREATE INDEX IF NOT EXISTS cache_key_idx ON cache (key);
CREATE INDEX IF NOT EXISTS cache_ref_last_idx ON cache (ref_last);
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_schema_creates_both_indexes() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(CACHE_SCHEMA).unwrap();

        let mut stmt = conn
            .prepare("SELECT name FROM sqlite_master WHERE type = 'index' AND tbl_name = ?1 AND sql IS NOT NULL ORDER BY name")
            .unwrap();
        let names: Vec<String> = stmt
            .query_map([TABLE_NAME], |row| row.get(0))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();

        assert_eq!(names, vec!["cache_key_idx", "cache_ref_last_idx"]);
    }

    #[test]
    fn test_purge_query_uses_ref_last_index() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(CACHE_SCHEMA).unwrap();

        let mut stmt = conn
            .prepare("EXPLAIN QUERY PLAN SELECT id FROM cache WHERE ref_last >= 1 AND ref_last <= 2")
            .unwrap();
        let plan: Vec<String> = stmt
            .query_map([], |row| row.get(3))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();

        assert!(plan.iter().any(|line| line.contains("cache_ref_last_idx")));
    }

    #[test]
    fn test_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(CACHE_SCHEMA).unwrap();
        conn.execute_batch(CACHE_SCHEMA).unwrap();
    }
}
