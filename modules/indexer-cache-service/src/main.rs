//! Indexer Cache Service — keeps per-account token/NFT lists warm.
//!
//! Composition root: reads env config, opens the durable store, wires the
//! cache and indexer client together, and runs the refresh worker.

use std::sync::Arc;

use indexer_cache_service::{cache, db, indexer, worker};

use indexer_cache_types::{CACHE_VERSION, UPDATE_REQUEST_INTERVAL_MS};
use tokio::sync::Mutex;

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    env_logger::init();

    let db_path = std::env::var("INDEXER_CACHE_DB_PATH")
        .unwrap_or_else(|_| "./indexer_cache.db".to_string());

    let indexer_url = std::env::var("INDEXER_SERVICE_URL")
        .unwrap_or_else(|_| "https://api.kitwallet.app".to_string());

    let accounts: Vec<String> = std::env::var("INDEXER_WATCHED_ACCOUNTS")
        .unwrap_or_default()
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    let poll_interval_secs: u64 = std::env::var("INDEXER_CACHE_POLL_INTERVAL")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(60);

    let refresh_interval_ms: i64 = std::env::var("INDEXER_CACHE_REFRESH_INTERVAL_MS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(UPDATE_REQUEST_INTERVAL_MS);

    log::info!("Opening cache store at: {}", db_path);
    let store = Arc::new(db::CacheStore::open(&db_path).expect("Failed to open cache store"));

    match store.get_stats(CACHE_VERSION) {
        Ok(stats) => log::info!(
            "Cache store: {} records ({} at version {})",
            stats.total_records,
            stats.current_version_records,
            CACHE_VERSION
        ),
        Err(e) => log::warn!("Failed to read cache stats: {}", e),
    }

    if accounts.is_empty() {
        log::warn!("INDEXER_WATCHED_ACCOUNTS not set — nothing to refresh");
        return;
    }

    let cache = Arc::new(cache::IndexerCache::with_config(
        store,
        CACHE_VERSION,
        refresh_interval_ms,
    ));
    let client = Arc::new(indexer::IndexerClient::new(&indexer_url));
    let last_tick_at: Arc<Mutex<Option<String>>> = Arc::new(Mutex::new(None));

    log::info!(
        "Indexer cache service started (indexer: {}, refresh interval: {}ms)",
        indexer_url,
        refresh_interval_ms
    );

    worker::run_worker(cache, client, accounts, poll_interval_secs, last_tick_at).await;
}
