//! HTTP client for the wallet contract-helper indexer.
//!
//! Exposes the two "what changed since this timestamp" queries the cache
//! accumulates: likely NFT contracts and likely fungible token contracts
//! for an account.

use indexer_cache_types::{LIKELY_NFTS_KIND, LIKELY_TOKENS_KIND};

/// Response shape of the `*FromBlock` indexer endpoints.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct IndexerListResponse {
    pub list: Vec<String>,
    #[serde(rename = "lastBlockTimestamp")]
    pub last_block_timestamp: Option<i64>,
    pub version: Option<i64>,
}

pub struct IndexerClient {
    client: reqwest::Client,
    base_url: String,
}

impl IndexerClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// NFT contract identifiers the account has likely interacted with
    /// since `from_timestamp`. An empty list is a normal answer.
    pub async fn likely_nfts(
        &self,
        account_id: &str,
        from_timestamp: Option<i64>,
    ) -> Result<Vec<String>, String> {
        self.fetch_from_block(account_id, "likelyNFTsFromBlock", from_timestamp)
            .await
    }

    /// Fungible token contract identifiers, same contract as `likely_nfts`.
    pub async fn likely_tokens(
        &self,
        account_id: &str,
        from_timestamp: Option<i64>,
    ) -> Result<Vec<String>, String> {
        self.fetch_from_block(account_id, "likelyTokensFromBlock", from_timestamp)
            .await
    }

    /// Map a cache kind tag to its fetcher.
    pub async fn fetch_kind(
        &self,
        account_id: &str,
        kind: &str,
        from_timestamp: Option<i64>,
    ) -> Result<Vec<String>, String> {
        match kind {
            LIKELY_NFTS_KIND => self.likely_nfts(account_id, from_timestamp).await,
            LIKELY_TOKENS_KIND => self.likely_tokens(account_id, from_timestamp).await,
            other => Err(format!("Unknown cache kind: {}", other)),
        }
    }

    async fn fetch_from_block(
        &self,
        account_id: &str,
        method: &str,
        from_timestamp: Option<i64>,
    ) -> Result<Vec<String>, String> {
        let mut url = format!("{}/account/{}/{}", self.base_url, account_id, method);
        if let Some(ts) = from_timestamp {
            url.push_str(&format!("?fromBlockTimestamp={}", ts));
        }

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| format!("Indexer request failed: {}", e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| format!("Failed to read indexer response: {}", e))?;

        if !status.is_success() {
            return Err(format!("Indexer error ({}): {}", status, truncate_error(&body)));
        }

        parse_list_response(&body)
    }
}

fn parse_list_response(body: &str) -> Result<Vec<String>, String> {
    let parsed: IndexerListResponse =
        serde_json::from_str(body).map_err(|e| format!("Invalid indexer response: {}", e))?;
    Ok(parsed.list)
}

fn truncate_error(body: &str) -> &str {
    match body.char_indices().nth(200) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_list_response() {
        let body = r#"{"lastBlockTimestamp":1700000000000,"version":1,"list":["x.near","y.near"]}"#;
        let list = parse_list_response(body).unwrap();
        assert_eq!(list, vec!["x.near".to_string(), "y.near".to_string()]);
    }

    #[test]
    fn test_parse_empty_list_is_success() {
        let list = parse_list_response(r#"{"list":[]}"#).unwrap();
        assert!(list.is_empty());
    }

    #[test]
    fn test_parse_missing_list_is_error() {
        assert!(parse_list_response(r#"{"lastBlockTimestamp":0}"#).is_err());
    }
}
