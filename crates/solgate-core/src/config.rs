//! ============================================================================
//! Gate Configuration
//! ============================================================================
//! Runtime configuration for the token-gated community tool. Defaults are
//! production values; every knob can be overridden via environment variables
//! (SOLGATE_RPC_URL, SOLGATE_INDEXER_URL, SOLGATE_INDEXER_API_KEY,
//! SOLGATE_KEYPAIR_PATH).
//! ============================================================================

use serde::{Deserialize, Serialize};

use crate::access::{DEFAULT_CACHE_TTL_SECS, DEFAULT_TOKEN_EXPIRATION_SECS};

/// Default Solana RPC endpoint
pub const DEFAULT_RPC_URL: &str = "https://api.mainnet-beta.solana.com";

/// Fixed timeout for indexer HTTP requests, in seconds
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

/// Configuration for the token-gated community tool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateConfig {
    /// Solana RPC endpoint for live holdings lookups
    pub rpc_url: String,
    /// Holdings indexer API base URL (NFT collection lookups)
    pub indexer_url: Option<String>,
    /// API key sent to the indexer, if it requires one
    pub indexer_api_key: Option<String>,
    /// Path to the caller's keypair file (JSON byte array)
    pub keypair_path: Option<String>,
    /// Verification cache TTL in seconds
    pub cache_ttl_secs: i64,
    /// Default access token lifetime in seconds
    pub default_token_expiration_secs: i64,
    /// Timeout for indexer HTTP requests in seconds
    pub http_timeout_secs: u64,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            rpc_url: DEFAULT_RPC_URL.to_string(),
            indexer_url: None,
            indexer_api_key: None,
            keypair_path: None,
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            default_token_expiration_secs: DEFAULT_TOKEN_EXPIRATION_SECS,
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
        }
    }
}

impl GateConfig {
    /// Defaults with environment-variable overrides applied
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = std::env::var("SOLGATE_RPC_URL") {
            config.rpc_url = url;
        }
        if let Ok(url) = std::env::var("SOLGATE_INDEXER_URL") {
            config.indexer_url = Some(url);
        }
        if let Ok(key) = std::env::var("SOLGATE_INDEXER_API_KEY") {
            config.indexer_api_key = Some(key);
        }
        if let Ok(path) = std::env::var("SOLGATE_KEYPAIR_PATH") {
            config.keypair_path = Some(path);
        }
        config
    }
}
