//! Shared types for the indexer cache service and its consumers.

use serde::{Deserialize, Serialize};

/// Current shape version of cached records. Bumping this makes every
/// existing record unreachable; old rows are left behind untouched.
pub const CACHE_VERSION: i64 = 1;

/// Kind tag for the accumulated list of NFT contract identifiers.
pub const LIKELY_NFTS_KIND: &str = "likelyNFTs";

/// Kind tag for the accumulated list of fungible token contract identifiers.
pub const LIKELY_TOKENS_KIND: &str = "likelyTokens";

/// Default minimum time between remote fetches for the same record.
pub const UPDATE_REQUEST_INTERVAL_MS: i64 = 30 * 1000;

/// The payload of a cache record: when it was last refreshed and the
/// accumulated, deduplicated item identifiers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedData {
    /// Last successful refresh time, epoch milliseconds.
    pub timestamp: i64,
    /// Deduplicated item identifiers. Stored order is unspecified.
    pub list: Vec<String>,
}

/// One cached record, unique per (subject_id, kind, schema_version).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheRecord {
    pub subject_id: String,
    pub kind: String,
    pub schema_version: i64,
    pub data: CachedData,
}

/// Row counts reported by the store, split by schema version.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStats {
    pub total_records: i64,
    pub current_version_records: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_record_json_shape() {
        let record = CacheRecord {
            subject_id: "alice.near".to_string(),
            kind: LIKELY_NFTS_KIND.to_string(),
            schema_version: CACHE_VERSION,
            data: CachedData {
                timestamp: 1_700_000_000_000,
                list: vec!["tokenA".to_string()],
            },
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["subject_id"], "alice.near");
        assert_eq!(json["kind"], "likelyNFTs");
        assert_eq!(json["data"]["timestamp"], 1_700_000_000_000i64);
        assert_eq!(json["data"]["list"][0], "tokenA");
    }
}
