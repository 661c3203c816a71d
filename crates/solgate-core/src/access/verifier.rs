//! ============================================================================
//! Access Verifier - Cached token-holding verification
//! ============================================================================
//! Decides whether a wallet satisfies a community's holding requirement.
//! Results are cached per (wallet, community, chain) so repeated checks
//! within the TTL never hit the holdings provider or re-count stats.
//! ============================================================================

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::community::{AccessRequirements, CommunityStore, TokenType};
use crate::holdings::HoldingsProvider;
use crate::types::{Blockchain, GateError};

/// Default cache duration in seconds (5 minutes)
pub const DEFAULT_CACHE_TTL_SECS: i64 = 300;

/// Maximum number of entries in the verification cache to prevent unbounded growth
const MAX_CACHE_SIZE: usize = 1000;

/// Outcome of a single access verification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessVerification {
    pub community_id: String,
    pub wallet_address: String,
    pub has_access: bool,
    pub blockchain: Blockchain,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nft_collection: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owned_nfts: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_nfts: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requirements: Option<AccessRequirements>,
    /// RFC 3339 time of the underlying check (cache hits keep the original)
    pub verification_time: String,
}

impl AccessVerification {
    fn base(community_id: &str, wallet: &str, blockchain: Blockchain) -> Self {
        Self {
            community_id: community_id.to_string(),
            wallet_address: wallet.to_string(),
            has_access: false,
            blockchain,
            reason: None,
            token_address: None,
            required_amount: None,
            actual_amount: None,
            nft_collection: None,
            owned_nfts: None,
            required_nfts: None,
            requirements: None,
            verification_time: Utc::now().to_rfc3339(),
        }
    }
}

/// Cached verification outcome
#[derive(Debug, Clone)]
struct CachedVerification {
    cached_at: i64,
    result: AccessVerification,
}

/// Access verifier with TTL-cached results
pub struct AccessVerifier {
    store: Arc<CommunityStore>,
    provider: Arc<dyn HoldingsProvider>,
    cache: RwLock<HashMap<String, CachedVerification>>,
    cache_ttl_secs: i64,
}

impl AccessVerifier {
    pub fn new(store: Arc<CommunityStore>, provider: Arc<dyn HoldingsProvider>) -> Self {
        Self::with_cache_ttl(store, provider, DEFAULT_CACHE_TTL_SECS)
    }

    pub fn with_cache_ttl(
        store: Arc<CommunityStore>,
        provider: Arc<dyn HoldingsProvider>,
        cache_ttl_secs: i64,
    ) -> Self {
        Self {
            store,
            provider,
            cache: RwLock::new(HashMap::new()),
            cache_ttl_secs,
        }
    }

    /// Verify whether a wallet may access a community.
    ///
    /// Existing members short-circuit to granted. Otherwise the cached
    /// result is returned when fresh; a cache miss performs the holdings
    /// check, updates the community counters once, and caches the outcome.
    pub async fn verify_access(
        &self,
        community_id: &str,
        wallet_address: &str,
        blockchain: Blockchain,
    ) -> Result<AccessVerification, GateError> {
        let requirements = self.store.requirements(community_id).await?;
        if wallet_address.is_empty() {
            return Err(GateError::Validation("Wallet address is required".into()));
        }

        // Members of any role bypass the holdings check entirely
        if self
            .store
            .member_role(community_id, wallet_address)
            .await?
            .is_some()
        {
            let mut result = AccessVerification::base(community_id, wallet_address, blockchain);
            result.has_access = true;
            result.reason = Some("Already a member".into());
            return Ok(result);
        }

        let cache_key = format!("{}_{}_{}", wallet_address, community_id, blockchain);
        let now = Utc::now().timestamp();

        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.get(&cache_key) {
                if now - cached.cached_at < self.cache_ttl_secs {
                    debug!(
                        "Cache hit for {} (age: {}s)",
                        cache_key,
                        now - cached.cached_at
                    );
                    return Ok(cached.result.clone());
                }
            }
        }

        debug!("Cache miss for {}, querying holdings provider", cache_key);
        let result = self
            .check_requirements(community_id, wallet_address, &requirements, blockchain)
            .await?;

        // Stats are counted on cache misses only
        self.store
            .record_access_attempt(community_id, result.has_access)
            .await?;

        {
            let mut cache = self.cache.write().await;
            // Evict oldest entry if cache is at capacity
            if cache.len() >= MAX_CACHE_SIZE && !cache.contains_key(&cache_key) {
                if let Some(oldest_key) = cache
                    .iter()
                    .min_by_key(|(_, v)| v.cached_at)
                    .map(|(k, _)| k.clone())
                {
                    cache.remove(&oldest_key);
                }
            }
            cache.insert(
                cache_key,
                CachedVerification {
                    cached_at: now,
                    result: result.clone(),
                },
            );
        }

        info!(
            "Access {} for {} in community {}",
            if result.has_access { "granted" } else { "denied" },
            wallet_address,
            community_id
        );

        Ok(result)
    }

    async fn check_requirements(
        &self,
        community_id: &str,
        wallet_address: &str,
        requirements: &AccessRequirements,
        blockchain: Blockchain,
    ) -> Result<AccessVerification, GateError> {
        let mut result = AccessVerification::base(community_id, wallet_address, blockchain);

        match requirements.token_type {
            TokenType::Fungible => {
                let token_address = requirements.token_address.as_deref().ok_or_else(|| {
                    GateError::Validation(
                        "Community requirements have no token_address configured".into(),
                    )
                })?;
                let actual = self
                    .provider
                    .token_balance(wallet_address, token_address, blockchain)
                    .await?;

                result.has_access = actual >= requirements.min_token_amount;
                result.token_address = Some(token_address.to_string());
                result.required_amount = Some(requirements.min_token_amount);
                result.actual_amount = Some(actual);
            }
            TokenType::Nft => {
                let collection = requirements
                    .nft_collection_address
                    .as_deref()
                    .ok_or_else(|| {
                        GateError::Validation(
                            "Community requirements have no nft_collection_address configured"
                                .into(),
                        )
                    })?;
                let owned = self
                    .provider
                    .nft_holdings(wallet_address, collection, blockchain)
                    .await?;

                result.has_access = !owned.is_empty();
                result.nft_collection = Some(collection.to_string());
                result.owned_nfts = Some(owned);
                result.required_nfts = Some(1);
            }
            TokenType::Multi => {
                // Every configured condition must hold
                if requirements.token_address.is_none()
                    && requirements.nft_collection_address.is_none()
                {
                    return Err(GateError::Validation(
                        "Community requirements have no gating asset configured".into(),
                    ));
                }

                let mut has_access = true;
                if let Some(token_address) = requirements.token_address.as_deref() {
                    let actual = self
                        .provider
                        .token_balance(wallet_address, token_address, blockchain)
                        .await?;
                    has_access &= actual >= requirements.min_token_amount;
                    result.actual_amount = Some(actual);
                }
                if let Some(collection) = requirements.nft_collection_address.as_deref() {
                    let owned = self
                        .provider
                        .nft_holdings(wallet_address, collection, blockchain)
                        .await?;
                    has_access &= !owned.is_empty();
                    result.owned_nfts = Some(owned);
                }

                result.has_access = has_access;
                result.requirements = Some(requirements.clone());
            }
        }

        Ok(result)
    }

    /// (total entries, entries still fresh)
    pub async fn cache_stats(&self) -> (usize, usize) {
        let cache = self.cache.read().await;
        let now = Utc::now().timestamp();
        let total = cache.len();
        let fresh = cache
            .values()
            .filter(|c| now - c.cached_at < self.cache_ttl_secs)
            .count();
        (total, fresh)
    }

    /// Drop every cached verification
    pub async fn clear_cache(&self) {
        let mut cache = self.cache.write().await;
        let count = cache.len();
        cache.clear();
        info!("Cleared {} cached verification entries", count);
    }
}
