//! ============================================================================
//! Indexer Holdings - HTTP holdings-indexer API client
//! ============================================================================
//! Queries a holdings indexer over HTTP for token balances and NFT
//! inventories. Requests carry a fixed timeout and are never retried.
//! ============================================================================

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::types::{Blockchain, GateError};

use super::HoldingsProvider;

#[derive(Debug, Deserialize)]
struct BalanceResponse {
    amount: f64,
}

#[derive(Debug, Deserialize)]
struct NftHoldingsResponse {
    mints: Vec<String>,
}

/// HTTP client against a holdings-indexer API
pub struct IndexerHoldings {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl IndexerHoldings {
    pub fn new(
        base_url: &str,
        api_key: Option<String>,
        timeout_secs: u64,
    ) -> Result<Self, GateError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| GateError::External(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    async fn fetch_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, GateError> {
        debug!("Indexer request: {}", url);

        let mut request = self.client.get(url);
        if let Some(key) = &self.api_key {
            request = request.header("x-api-key", key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| GateError::External(format!("Indexer request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GateError::External(format!(
                "Indexer error {}: {}",
                status, body
            )));
        }

        response
            .json()
            .await
            .map_err(|e| GateError::External(format!("Failed to parse indexer response: {}", e)))
    }
}

#[async_trait]
impl HoldingsProvider for IndexerHoldings {
    async fn token_balance(
        &self,
        wallet: &str,
        token_address: &str,
        blockchain: Blockchain,
    ) -> Result<f64, GateError> {
        let url = format!(
            "{}/balances/{}/{}/{}",
            self.base_url, blockchain, wallet, token_address
        );
        let response: BalanceResponse = self.fetch_json(&url).await?;
        Ok(response.amount)
    }

    async fn nft_holdings(
        &self,
        wallet: &str,
        collection_address: &str,
        blockchain: Blockchain,
    ) -> Result<Vec<String>, GateError> {
        let url = format!(
            "{}/nfts/{}/{}/{}",
            self.base_url, blockchain, wallet, collection_address
        );
        let response: NftHoldingsResponse = self.fetch_json(&url).await?;
        Ok(response.mints)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let indexer = IndexerHoldings::new("https://indexer.example/v1/", None, 10).unwrap();
        assert_eq!(indexer.base_url, "https://indexer.example/v1");
    }

    // Live-network test against a real indexer deployment
    #[tokio::test]
    #[ignore]
    async fn test_live_balance_lookup() {
        let indexer = IndexerHoldings::new("https://api.tokenverification.example/v1", None, 10)
            .unwrap();
        let result = indexer
            .token_balance("wallet", "mint", Blockchain::Solana)
            .await;
        assert!(result.is_err() || result.unwrap() >= 0.0);
    }
}
