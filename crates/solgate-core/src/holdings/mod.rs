//! ============================================================================
//! Holdings Providers - Wallet token/NFT balance lookup
//! ============================================================================
//! The access verifier consults a holdings provider to learn what a wallet
//! holds. Three implementations:
//! - SimulatedHoldings: deterministic pseudo-random data (default)
//! - RpcHoldings: SPL token balances from a Solana RPC node
//! - IndexerHoldings: HTTP holdings-indexer API
//! ============================================================================

mod indexer;
mod rpc;
mod simulated;

pub use indexer::IndexerHoldings;
pub use rpc::RpcHoldings;
pub use simulated::SimulatedHoldings;

use async_trait::async_trait;

use crate::types::{Blockchain, GateError};

/// External lookup of a wallet's holdings for a given asset.
///
/// Calls are blocking from the caller's perspective and bounded by a fixed
/// timeout; a failure surfaces as `GateError::External` and is never retried.
#[async_trait]
pub trait HoldingsProvider: Send + Sync {
    /// Balance of a fungible token, in display units
    async fn token_balance(
        &self,
        wallet: &str,
        token_address: &str,
        blockchain: Blockchain,
    ) -> Result<f64, GateError>;

    /// Mint addresses of NFTs the wallet owns in a collection
    async fn nft_holdings(
        &self,
        wallet: &str,
        collection_address: &str,
        blockchain: Blockchain,
    ) -> Result<Vec<String>, GateError>;
}
