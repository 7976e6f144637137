//! Accumulating record cache for expensive indexer queries.
//!
//! Each (subject, kind) pair owns one deduplicated list of item identifiers.
//! `accumulate` only hits the remote fetcher when the stored copy is older
//! than the refresh interval; inside the interval callers get the stored
//! list back unchanged. Newly fetched items are merged in with set
//! semantics, so each next request can send just the last timestamp instead
//! of re-reading the whole history.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;

use indexer_cache_types::{CachedData, CACHE_VERSION, UPDATE_REQUEST_INTERVAL_MS};
use tokio::sync::Mutex;

use crate::db::CacheStore;

pub struct IndexerCache {
    store: Arc<CacheStore>,
    cache_version: i64,
    refresh_interval_ms: i64,
    // One guard per (subject, kind): at most one accumulate runs per key,
    // so a second caller waits and then reads the finished call's record.
    in_flight: Mutex<HashMap<(String, String), Arc<Mutex<()>>>>,
}

impl IndexerCache {
    pub fn new(store: Arc<CacheStore>) -> Self {
        Self::with_config(store, CACHE_VERSION, UPDATE_REQUEST_INTERVAL_MS)
    }

    pub fn with_config(store: Arc<CacheStore>, cache_version: i64, refresh_interval_ms: i64) -> Self {
        Self {
            store,
            cache_version,
            refresh_interval_ms,
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    /// Return the accumulated list for (subject_id, kind), refreshing it
    /// from `fetch_since` first when the stored copy is stale or absent.
    ///
    /// `fetch_since` receives the last refresh timestamp (`None` on the
    /// first call) and must return `Ok(vec![])` when nothing is new. A
    /// fetch failure is logged and masked: the caller gets the previous
    /// list (empty if none) and nothing is persisted, so the next call
    /// retries immediately. Store lookup and persistence failures propagate.
    pub async fn accumulate<F, Fut>(
        &self,
        subject_id: &str,
        kind: &str,
        fetch_since: F,
    ) -> Result<Vec<String>, String>
    where
        F: FnOnce(Option<i64>) -> Fut,
        Fut: Future<Output = Result<Vec<String>, String>>,
    {
        let guard = self.key_guard(subject_id, kind).await;
        let _held = guard.lock().await;

        let record = self.store.get_record(subject_id, kind, self.cache_version)?;
        let last_timestamp = record.as_ref().map(|r| r.data.timestamp);
        let now = chrono::Utc::now().timestamp_millis();

        if let Some(ts) = last_timestamp {
            if now - ts < self.refresh_interval_ms {
                return Ok(record.map(|r| r.data.list).unwrap_or_default());
            }
        }

        let fetched = match fetch_since(last_timestamp).await {
            Ok(items) => items,
            Err(e) => {
                log::warn!(
                    "[INDEXER_CACHE] Fetch failed for {}/{}, serving cached list: {}",
                    subject_id,
                    kind,
                    e
                );
                return Ok(record.map(|r| r.data.list).unwrap_or_default());
            }
        };

        let mut merged: HashSet<String> = fetched.into_iter().collect();
        if let Some(ref r) = record {
            merged.extend(r.data.list.iter().cloned());
        }

        let updated = CachedData {
            timestamp: now,
            list: merged.into_iter().collect(),
        };
        self.store
            .upsert_record(subject_id, kind, self.cache_version, &updated)?;

        log::debug!(
            "[INDEXER_CACHE] Refreshed {}/{}: {} items",
            subject_id,
            kind,
            updated.list.len()
        );
        Ok(updated.list)
    }

    async fn key_guard(&self, subject_id: &str, kind: &str) -> Arc<Mutex<()>> {
        let mut map = self.in_flight.lock().await;
        map.entry((subject_id.to_string(), kind.to_string()))
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}
