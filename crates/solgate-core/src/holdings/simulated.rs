//! ============================================================================
//! Simulated Holdings - Deterministic pseudo-random wallet data
//! ============================================================================
//! Default provider. Balances and NFT inventories are derived from a digest
//! of (wallet, asset, chain), so repeated lookups always agree without any
//! network access. Tests pin exact values through the override setters.
//! ============================================================================

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::types::{Blockchain, GateError};

use super::HoldingsProvider;

/// Deterministic simulated holdings source
pub struct SimulatedHoldings {
    token_overrides: RwLock<HashMap<(String, String), f64>>,
    nft_overrides: RwLock<HashMap<(String, String), Vec<String>>>,
}

impl SimulatedHoldings {
    pub fn new() -> Self {
        Self {
            token_overrides: RwLock::new(HashMap::new()),
            nft_overrides: RwLock::new(HashMap::new()),
        }
    }

    /// Pin the balance reported for a wallet/token pair
    pub fn set_token_balance(&self, wallet: &str, token_address: &str, amount: f64) {
        if let Ok(mut overrides) = self.token_overrides.write() {
            overrides.insert((wallet.to_string(), token_address.to_string()), amount);
        }
    }

    /// Pin the NFT inventory reported for a wallet/collection pair
    pub fn set_nft_holdings(&self, wallet: &str, collection_address: &str, mints: Vec<String>) {
        if let Ok(mut overrides) = self.nft_overrides.write() {
            overrides.insert((wallet.to_string(), collection_address.to_string()), mints);
        }
    }
}

impl Default for SimulatedHoldings {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HoldingsProvider for SimulatedHoldings {
    async fn token_balance(
        &self,
        wallet: &str,
        token_address: &str,
        blockchain: Blockchain,
    ) -> Result<f64, GateError> {
        let key = (wallet.to_string(), token_address.to_string());
        let override_amount = self
            .token_overrides
            .read()
            .map_err(|_| GateError::External("Failed to acquire holdings lock".into()))?
            .get(&key)
            .copied();
        if let Some(amount) = override_amount {
            return Ok(amount);
        }

        // 0.0 .. 1000.0 in 0.1 steps
        let seed = digest_seed(&format!("{}:{}:{}", wallet, token_address, blockchain));
        let balance = (seed % 10_000) as f64 / 10.0;
        debug!(
            "Simulated balance for {} of {}: {}",
            wallet, token_address, balance
        );
        Ok(balance)
    }

    async fn nft_holdings(
        &self,
        wallet: &str,
        collection_address: &str,
        blockchain: Blockchain,
    ) -> Result<Vec<String>, GateError> {
        let key = (wallet.to_string(), collection_address.to_string());
        let override_mints = self
            .nft_overrides
            .read()
            .map_err(|_| GateError::External("Failed to acquire holdings lock".into()))?
            .get(&key)
            .cloned();
        if let Some(mints) = override_mints {
            return Ok(mints);
        }

        let seed = digest_seed(&format!("{}:{}:{}", wallet, collection_address, blockchain));
        let count = (seed % 4) as usize;
        let mints = (0..count)
            .map(|i| {
                let digest =
                    Sha256::digest(format!("{}:{}:{}", collection_address, wallet, i).as_bytes());
                bs58::encode(digest).into_string()
            })
            .collect();
        Ok(mints)
    }
}

fn digest_seed(input: &str) -> u64 {
    let digest = Sha256::digest(input.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_balance_is_deterministic() {
        let provider = SimulatedHoldings::new();
        let a = provider
            .token_balance("walletA", "Mint111", Blockchain::Solana)
            .await
            .unwrap();
        let b = provider
            .token_balance("walletA", "Mint111", Blockchain::Solana)
            .await
            .unwrap();
        assert_eq!(a, b);
        assert!((0.0..1000.0).contains(&a));
    }

    #[tokio::test]
    async fn test_balance_varies_by_chain() {
        let provider = SimulatedHoldings::new();
        let sol = provider
            .token_balance("walletA", "Mint111", Blockchain::Solana)
            .await
            .unwrap();
        let eth = provider
            .token_balance("walletA", "Mint111", Blockchain::Ethereum)
            .await
            .unwrap();
        // Distinct seeds; equality would be a one-in-ten-thousand accident
        assert_ne!(sol, eth);
    }

    #[tokio::test]
    async fn test_token_override() {
        let provider = SimulatedHoldings::new();
        provider.set_token_balance("walletA", "Mint111", 10.0);
        let amount = provider
            .token_balance("walletA", "Mint111", Blockchain::Solana)
            .await
            .unwrap();
        assert_eq!(amount, 10.0);
    }

    #[tokio::test]
    async fn test_nft_override_and_determinism() {
        let provider = SimulatedHoldings::new();
        provider.set_nft_holdings("walletA", "Col111", vec!["MintX".into()]);
        let owned = provider
            .nft_holdings("walletA", "Col111", Blockchain::Solana)
            .await
            .unwrap();
        assert_eq!(owned, vec!["MintX".to_string()]);

        let first = provider
            .nft_holdings("walletB", "Col111", Blockchain::Solana)
            .await
            .unwrap();
        let second = provider
            .nft_holdings("walletB", "Col111", Blockchain::Solana)
            .await
            .unwrap();
        assert_eq!(first, second);
        assert!(first.len() < 4);
    }
}
