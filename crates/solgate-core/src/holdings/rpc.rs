//! ============================================================================
//! RPC Holdings - SPL token balances from a Solana RPC node
//! ============================================================================
//! Reads the balance at the wallet's associated token account. A missing
//! account reads as zero (the wallet never held the token). NFT inventory
//! lookups are delegated to the indexer, which tracks collections.
//! ============================================================================

use std::str::FromStr;

use async_trait::async_trait;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::pubkey::Pubkey;
use spl_associated_token_account::get_associated_token_address;
use tracing::{debug, warn};

use crate::types::{Blockchain, GateError};

use super::{HoldingsProvider, IndexerHoldings};

/// Holdings provider backed by a Solana RPC endpoint
pub struct RpcHoldings {
    rpc_client: RpcClient,
    indexer: Option<IndexerHoldings>,
}

impl RpcHoldings {
    pub fn new(rpc_url: &str) -> Self {
        Self {
            rpc_client: RpcClient::new(rpc_url.to_string()),
            indexer: None,
        }
    }

    /// Attach an indexer for NFT collection lookups
    pub fn with_indexer(mut self, indexer: IndexerHoldings) -> Self {
        self.indexer = Some(indexer);
        self
    }

    fn parse_pubkey(address: &str, what: &str) -> Result<Pubkey, GateError> {
        Pubkey::from_str(address)
            .map_err(|e| GateError::Validation(format!("Invalid {} address: {}", what, e)))
    }
}

#[async_trait]
impl HoldingsProvider for RpcHoldings {
    async fn token_balance(
        &self,
        wallet: &str,
        token_address: &str,
        blockchain: Blockchain,
    ) -> Result<f64, GateError> {
        if blockchain != Blockchain::Solana {
            return Err(GateError::External(format!(
                "RPC holdings lookup is only available for solana, not {}",
                blockchain
            )));
        }

        let wallet_pubkey = Self::parse_pubkey(wallet, "wallet")?;
        let mint = Self::parse_pubkey(token_address, "token")?;
        let ata = get_associated_token_address(&wallet_pubkey, &mint);

        debug!("Checking balance for wallet {} at ATA {}", wallet, ata);

        match self.rpc_client.get_token_account_balance(&ata).await {
            Ok(balance) => {
                let amount = balance.ui_amount.unwrap_or(0.0);
                debug!("Balance of {} for {}: {}", token_address, wallet, amount);
                Ok(amount)
            }
            Err(e) => {
                // Account doesn't exist = 0 balance (wallet never held the token)
                warn!("Failed to get token account balance: {} - assuming 0", e);
                Ok(0.0)
            }
        }
    }

    async fn nft_holdings(
        &self,
        wallet: &str,
        collection_address: &str,
        blockchain: Blockchain,
    ) -> Result<Vec<String>, GateError> {
        match &self.indexer {
            Some(indexer) => {
                indexer
                    .nft_holdings(wallet, collection_address, blockchain)
                    .await
            }
            None => Err(GateError::External(
                "NFT holdings lookup requires an indexer (set SOLGATE_INDEXER_URL)".into(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_wallet_address() {
        let err = RpcHoldings::parse_pubkey("not-base58!", "wallet").unwrap_err();
        assert!(err.to_string().contains("Invalid wallet address"));
    }

    #[tokio::test]
    async fn test_nft_lookup_without_indexer() {
        let provider = RpcHoldings::new("https://api.devnet.solana.com");
        let err = provider
            .nft_holdings("wallet", "collection", Blockchain::Solana)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("requires an indexer"));
    }

    // Requires network access to a Solana RPC node
    #[tokio::test]
    #[ignore]
    async fn test_live_missing_account_reads_zero() {
        let provider = RpcHoldings::new("https://api.devnet.solana.com");
        let amount = provider
            .token_balance(
                "11111111111111111111111111111111",
                "So11111111111111111111111111111111111111112",
                Blockchain::Solana,
            )
            .await
            .unwrap();
        assert_eq!(amount, 0.0);
    }
}
