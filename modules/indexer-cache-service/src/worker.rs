//! Background worker that keeps watched accounts' cached lists warm.
//!
//! Every N seconds it runs one accumulate pass per account and kind. The
//! cache's freshness gate decides whether a pass actually reaches the
//! indexer, so short poll intervals stay cheap.

use std::sync::Arc;
use std::time::Duration;

use indexer_cache_types::{LIKELY_NFTS_KIND, LIKELY_TOKENS_KIND};
use tokio::sync::Mutex;

use crate::cache::IndexerCache;
use crate::indexer::IndexerClient;

const KINDS: [&str; 2] = [LIKELY_TOKENS_KIND, LIKELY_NFTS_KIND];

pub async fn run_worker(
    cache: Arc<IndexerCache>,
    client: Arc<IndexerClient>,
    accounts: Vec<String>,
    poll_interval_secs: u64,
    last_tick_at: Arc<Mutex<Option<String>>>,
) {
    log::info!(
        "[INDEXER_CACHE] Worker started ({} accounts, poll interval: {}s)",
        accounts.len(),
        poll_interval_secs
    );

    loop {
        tokio::time::sleep(Duration::from_secs(poll_interval_secs)).await;

        match poll_tick(&cache, &client, &accounts).await {
            Ok(refreshed) => {
                let now = chrono::Utc::now().to_rfc3339();
                *last_tick_at.lock().await = Some(now);
                if refreshed > 0 {
                    log::info!("[INDEXER_CACHE] Tick complete: {} lists refreshed", refreshed);
                }
            }
            Err(e) => {
                log::error!("[INDEXER_CACHE] Tick error: {}", e);
            }
        }
    }
}

/// One pass over every (account, kind) pair. Per-pair errors are logged and
/// do not abort the tick.
async fn poll_tick(
    cache: &IndexerCache,
    client: &IndexerClient,
    accounts: &[String],
) -> Result<usize, String> {
    if accounts.is_empty() {
        return Ok(0);
    }

    log::debug!("[INDEXER_CACHE] Tick: checking {} accounts", accounts.len());
    let mut refreshed = 0usize;

    for account in accounts {
        for kind in KINDS {
            let result = cache
                .accumulate(account, kind, |since| client.fetch_kind(account, kind, since))
                .await;

            match result {
                Ok(list) => {
                    refreshed += 1;
                    log::debug!(
                        "[INDEXER_CACHE] {}/{}: {} items cached",
                        account,
                        kind,
                        list.len()
                    );
                }
                Err(e) => {
                    log::warn!("[INDEXER_CACHE] Error refreshing {}/{}: {}", account, kind, e);
                }
            }
        }
    }

    Ok(refreshed)
}
