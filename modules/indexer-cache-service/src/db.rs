//! SQLite-backed durable store for accumulated indexer records.
//!
//! One row per (subject_id, kind, schema_version); the composite key is the
//! primary key, so lookups and updates address the row directly instead of
//! scanning. The accumulated list is stored as a JSON string column.

use indexer_cache_types::{CacheRecord, CacheStats, CachedData};
use rusqlite::{Connection, Result as SqliteResult};
use std::sync::Mutex;

pub struct CacheStore {
    conn: Mutex<Connection>,
}

impl CacheStore {
    pub fn open(path: &str) -> SqliteResult<Self> {
        let conn = if path == ":memory:" {
            Connection::open_in_memory()?
        } else {
            Connection::open(path)?
        };
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.create_tables()?;
        Ok(store)
    }

    fn create_tables(&self) -> SqliteResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "CREATE TABLE IF NOT EXISTS cache_records (
                subject_id TEXT NOT NULL,
                kind TEXT NOT NULL,
                schema_version INTEGER NOT NULL,
                data_timestamp INTEGER NOT NULL,
                item_list TEXT NOT NULL,
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at TEXT NOT NULL DEFAULT (datetime('now')),
                PRIMARY KEY (subject_id, kind, schema_version)
            )",
            [],
        )?;
        Ok(())
    }

    /// Look up the record for a (subject, kind) pair at the given schema
    /// version. Rows at other versions are invisible.
    pub fn get_record(
        &self,
        subject_id: &str,
        kind: &str,
        schema_version: i64,
    ) -> Result<Option<CacheRecord>, String> {
        let conn = self.conn.lock().unwrap();
        let result = conn.query_row(
            "SELECT subject_id, kind, schema_version, data_timestamp, item_list
             FROM cache_records
             WHERE subject_id = ?1 AND kind = ?2 AND schema_version = ?3",
            rusqlite::params![subject_id, kind, schema_version],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, i64>(3)?,
                    row.get::<_, String>(4)?,
                ))
            },
        );

        match result {
            Ok((subject_id, kind, schema_version, timestamp, item_list)) => {
                let list: Vec<String> = serde_json::from_str(&item_list)
                    .map_err(|e| format!("Corrupt item list for {}/{}: {}", subject_id, kind, e))?;
                Ok(Some(CacheRecord {
                    subject_id,
                    kind,
                    schema_version,
                    data: CachedData { timestamp, list },
                }))
            }
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(format!("Database error: {}", e)),
        }
    }

    /// Insert the record if absent, otherwise replace its data in place.
    pub fn upsert_record(
        &self,
        subject_id: &str,
        kind: &str,
        schema_version: i64,
        data: &CachedData,
    ) -> Result<(), String> {
        let item_list = serde_json::to_string(&data.list)
            .map_err(|e| format!("Failed to encode item list: {}", e))?;

        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO cache_records
                 (subject_id, kind, schema_version, data_timestamp, item_list)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(subject_id, kind, schema_version) DO UPDATE SET
                 data_timestamp = excluded.data_timestamp,
                 item_list = excluded.item_list,
                 updated_at = datetime('now')",
            rusqlite::params![subject_id, kind, schema_version, data.timestamp, item_list],
        )
        .map_err(|e| format!("Failed to upsert record: {}", e))?;
        Ok(())
    }

    pub fn get_stats(&self, current_version: i64) -> Result<CacheStats, String> {
        let conn = self.conn.lock().unwrap();
        let total: i64 = conn
            .query_row("SELECT COUNT(*) FROM cache_records", [], |r| r.get(0))
            .unwrap_or(0);
        let current: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM cache_records WHERE schema_version = ?1",
                rusqlite::params![current_version],
                |r| r.get(0),
            )
            .unwrap_or(0);
        Ok(CacheStats {
            total_records: total,
            current_version_records: current,
        })
    }

    /// Delete rows stranded by a schema version bump. Never called
    /// automatically; the owning application decides when to reclaim space.
    pub fn prune_stale_versions(&self, current_version: i64) -> Result<usize, String> {
        let conn = self.conn.lock().unwrap();
        let removed = conn
            .execute(
                "DELETE FROM cache_records WHERE schema_version != ?1",
                rusqlite::params![current_version],
            )
            .map_err(|e| format!("Failed to prune stale versions: {}", e))?;
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_data(timestamp: i64, items: &[&str]) -> CachedData {
        CachedData {
            timestamp,
            list: items.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_upsert_and_get_round_trip() {
        let store = CacheStore::open(":memory:").unwrap();

        store
            .upsert_record("alice.near", "likelyNFTs", 1, &sample_data(1000, &["tokenA"]))
            .unwrap();

        let record = store.get_record("alice.near", "likelyNFTs", 1).unwrap().unwrap();
        assert_eq!(record.subject_id, "alice.near");
        assert_eq!(record.kind, "likelyNFTs");
        assert_eq!(record.schema_version, 1);
        assert_eq!(record.data.timestamp, 1000);
        assert_eq!(record.data.list, vec!["tokenA".to_string()]);
    }

    #[test]
    fn test_upsert_updates_in_place() {
        let store = CacheStore::open(":memory:").unwrap();

        store
            .upsert_record("alice.near", "likelyNFTs", 1, &sample_data(1000, &["tokenA"]))
            .unwrap();
        store
            .upsert_record(
                "alice.near",
                "likelyNFTs",
                1,
                &sample_data(2000, &["tokenA", "tokenB"]),
            )
            .unwrap();

        let stats = store.get_stats(1).unwrap();
        assert_eq!(stats.total_records, 1);

        let record = store.get_record("alice.near", "likelyNFTs", 1).unwrap().unwrap();
        assert_eq!(record.data.timestamp, 2000);
        assert_eq!(record.data.list.len(), 2);
    }

    #[test]
    fn test_versions_are_isolated() {
        let store = CacheStore::open(":memory:").unwrap();

        store
            .upsert_record("alice.near", "likelyNFTs", 1, &sample_data(1000, &["tokenA"]))
            .unwrap();

        assert!(store.get_record("alice.near", "likelyNFTs", 2).unwrap().is_none());

        store
            .upsert_record("alice.near", "likelyNFTs", 2, &sample_data(2000, &["tokenX"]))
            .unwrap();

        let v1 = store.get_record("alice.near", "likelyNFTs", 1).unwrap().unwrap();
        assert_eq!(v1.data.list, vec!["tokenA".to_string()]);
        let v2 = store.get_record("alice.near", "likelyNFTs", 2).unwrap().unwrap();
        assert_eq!(v2.data.list, vec!["tokenX".to_string()]);
    }

    #[test]
    fn test_prune_stale_versions() {
        let store = CacheStore::open(":memory:").unwrap();

        store
            .upsert_record("alice.near", "likelyNFTs", 1, &sample_data(1000, &["tokenA"]))
            .unwrap();
        store
            .upsert_record("alice.near", "likelyNFTs", 2, &sample_data(2000, &["tokenX"]))
            .unwrap();
        store
            .upsert_record("bob.near", "likelyTokens", 1, &sample_data(1500, &["usdc"]))
            .unwrap();

        let removed = store.prune_stale_versions(2).unwrap();
        assert_eq!(removed, 2);

        assert!(store.get_record("alice.near", "likelyNFTs", 1).unwrap().is_none());
        assert!(store.get_record("bob.near", "likelyTokens", 1).unwrap().is_none());
        assert!(store.get_record("alice.near", "likelyNFTs", 2).unwrap().is_some());
    }

    #[test]
    fn test_records_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.db");
        let path = path.to_str().unwrap();

        {
            let store = CacheStore::open(path).unwrap();
            store
                .upsert_record("alice.near", "likelyTokens", 1, &sample_data(1000, &["usdc"]))
                .unwrap();
        }

        let store = CacheStore::open(path).unwrap();
        let record = store.get_record("alice.near", "likelyTokens", 1).unwrap().unwrap();
        assert_eq!(record.data.list, vec!["usdc".to_string()]);
    }
}
