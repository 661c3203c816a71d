//! ============================================================================
//! Community Store - In-memory community records
//! ============================================================================
//! Owns every community record for the lifetime of the process. Communities
//! are created and mutated here; they are never deleted. All access goes
//! through an async RwLock so the store is safe behind a concurrent
//! dispatcher.
//! ============================================================================

use std::collections::HashMap;

use chrono::Utc;
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::types::GateError;

use super::types::{
    AccessLevel, AccessRequirements, Community, CommunityStats, CommunityStatsReport,
    CommunitySummary, MemberRoster, RequirementsUpdate, TokenType,
};

/// Outcome of an `add_member` call
#[derive(Debug, Clone)]
pub struct MembershipUpdate {
    pub wallet_address: String,
    pub access_level: AccessLevel,
    /// True when the wallet already held this exact role (no-op)
    pub already_present: bool,
    pub total_members: u64,
}

/// In-memory store of community records
pub struct CommunityStore {
    communities: RwLock<HashMap<String, Community>>,
}

impl CommunityStore {
    pub fn new() -> Self {
        Self {
            communities: RwLock::new(HashMap::new()),
        }
    }

    /// Create a new token-gated community.
    /// The caller wallet (when known) becomes `created_by` and the first admin.
    pub async fn create(
        &self,
        name: &str,
        description: &str,
        token_address: Option<String>,
        min_token_amount: f64,
        token_type: TokenType,
        nft_collection_address: Option<String>,
        caller: Option<&str>,
    ) -> Result<Community, GateError> {
        if name.is_empty() {
            return Err(GateError::Validation("Community name is required".into()));
        }
        if token_address.is_none() && nft_collection_address.is_none() {
            return Err(GateError::Validation(
                "Either token_address or nft_collection_address is required".into(),
            ));
        }

        let id = community_id(name);
        let mut members = MemberRoster::default();
        if let Some(wallet) = caller {
            members.admins.push(wallet.to_string());
        }

        let community = Community {
            id: id.clone(),
            name: name.to_string(),
            description: description.to_string(),
            created_at: Utc::now().to_rfc3339(),
            created_by: caller.unwrap_or("anonymous").to_string(),
            requirements: AccessRequirements {
                token_type,
                token_address,
                min_token_amount,
                nft_collection_address,
            },
            members,
            stats: CommunityStats::default(),
        };

        self.communities
            .write()
            .await
            .insert(id.clone(), community.clone());

        info!("Created community {} ({})", id, name);
        Ok(community)
    }

    /// Apply a partial requirements update.
    /// Caller must be an admin; an anonymous caller is rejected unless the
    /// community has no admins at all (bootstrap case for communities
    /// created without a loaded wallet).
    pub async fn configure_requirements(
        &self,
        community_id: &str,
        update: RequirementsUpdate,
        caller: Option<&str>,
    ) -> Result<AccessRequirements, GateError> {
        let mut communities = self.communities.write().await;
        let community = communities
            .get_mut(community_id)
            .ok_or_else(|| GateError::CommunityNotFound(community_id.to_string()))?;

        if !community.members.admins.is_empty() {
            let authorized = caller
                .map(|w| community.members.admins.iter().any(|a| a == w))
                .unwrap_or(false);
            if !authorized {
                return Err(GateError::Unauthorized(
                    "Only community admins can configure requirements".into(),
                ));
            }
        }

        let requirements = &mut community.requirements;
        if let Some(token_type) = update.token_type {
            requirements.token_type = token_type;
        }
        if let Some(token_address) = update.token_address {
            requirements.token_address = Some(token_address);
        }
        if let Some(min_token_amount) = update.min_token_amount {
            requirements.min_token_amount = min_token_amount;
        }
        if let Some(nft_collection_address) = update.nft_collection_address {
            requirements.nft_collection_address = Some(nft_collection_address);
        }

        debug!("Updated requirements for community {}", community_id);
        Ok(requirements.clone())
    }

    /// Add (or move) a wallet to a role bucket.
    /// Granting moderator/admin requires the caller to be an existing admin.
    pub async fn add_member(
        &self,
        community_id: &str,
        wallet: &str,
        level: AccessLevel,
        caller: Option<&str>,
    ) -> Result<MembershipUpdate, GateError> {
        if wallet.is_empty() {
            return Err(GateError::Validation("Wallet address is required".into()));
        }

        let mut communities = self.communities.write().await;
        let community = communities
            .get_mut(community_id)
            .ok_or_else(|| GateError::CommunityNotFound(community_id.to_string()))?;

        if level != AccessLevel::Member {
            let authorized = caller
                .map(|w| community.members.admins.iter().any(|a| a == w))
                .unwrap_or(false);
            if !authorized {
                return Err(GateError::Unauthorized(
                    "Only community admins can add moderators or admins".into(),
                ));
            }
        }

        let already_present = community.members.assign(wallet, level);
        community.stats.total_members = community.members.total();

        if !already_present {
            info!(
                "Added {} to community {} as {}",
                wallet, community_id, level
            );
        }

        Ok(MembershipUpdate {
            wallet_address: wallet.to_string(),
            access_level: level,
            already_present,
            total_members: community.stats.total_members,
        })
    }

    /// Remove a wallet from whichever role bucket holds it
    pub async fn remove_member(
        &self,
        community_id: &str,
        wallet: &str,
    ) -> Result<AccessLevel, GateError> {
        if wallet.is_empty() {
            return Err(GateError::Validation("Wallet address is required".into()));
        }

        let mut communities = self.communities.write().await;
        let community = communities
            .get_mut(community_id)
            .ok_or_else(|| GateError::CommunityNotFound(community_id.to_string()))?;

        let removed_from = community.members.remove(wallet).ok_or_else(|| {
            GateError::Validation("Wallet is not a member of this community".into())
        })?;
        community.stats.total_members = community.members.total();

        info!(
            "Removed {} ({}) from community {}",
            wallet, removed_from, community_id
        );
        Ok(removed_from)
    }

    /// Role held by a wallet, if any
    pub async fn member_role(
        &self,
        community_id: &str,
        wallet: &str,
    ) -> Result<Option<AccessLevel>, GateError> {
        if wallet.is_empty() {
            return Err(GateError::Validation("Wallet address is required".into()));
        }

        let communities = self.communities.read().await;
        let community = communities
            .get(community_id)
            .ok_or_else(|| GateError::CommunityNotFound(community_id.to_string()))?;
        Ok(community.members.role_of(wallet))
    }

    /// Snapshot of the full roster
    pub async fn members(&self, community_id: &str) -> Result<MemberRoster, GateError> {
        let communities = self.communities.read().await;
        let community = communities
            .get(community_id)
            .ok_or_else(|| GateError::CommunityNotFound(community_id.to_string()))?;
        Ok(community.members.clone())
    }

    /// Snapshot of the access requirements
    pub async fn requirements(
        &self,
        community_id: &str,
    ) -> Result<AccessRequirements, GateError> {
        let communities = self.communities.read().await;
        let community = communities
            .get(community_id)
            .ok_or_else(|| GateError::CommunityNotFound(community_id.to_string()))?;
        Ok(community.requirements.clone())
    }

    pub async fn contains(&self, community_id: &str) -> bool {
        self.communities.read().await.contains_key(community_id)
    }

    /// Statistics with `total_members` recomputed from the roster
    pub async fn stats(
        &self,
        community_id: &str,
    ) -> Result<(Community, CommunityStatsReport), GateError> {
        let mut communities = self.communities.write().await;
        let community = communities
            .get_mut(community_id)
            .ok_or_else(|| GateError::CommunityNotFound(community_id.to_string()))?;

        let admin_count = community.members.admins.len() as u64;
        let moderator_count = community.members.moderators.len() as u64;
        let member_count = community.members.members.len() as u64;
        community.stats.total_members = admin_count + moderator_count + member_count;

        let report = CommunityStatsReport {
            total_members: community.stats.total_members,
            admin_count,
            moderator_count,
            member_count,
            access_requests: community.stats.access_requests,
            access_granted: community.stats.access_granted,
            access_denied: community.stats.access_denied,
        };
        Ok((community.clone(), report))
    }

    /// Record one verification attempt against the community counters.
    /// Called on cache misses only; cache hits must not re-increment.
    pub async fn record_access_attempt(
        &self,
        community_id: &str,
        granted: bool,
    ) -> Result<(), GateError> {
        let mut communities = self.communities.write().await;
        let community = communities
            .get_mut(community_id)
            .ok_or_else(|| GateError::CommunityNotFound(community_id.to_string()))?;

        community.stats.access_requests += 1;
        if granted {
            community.stats.access_granted += 1;
        } else {
            community.stats.access_denied += 1;
        }
        Ok(())
    }

    /// Summaries of every community
    pub async fn list(&self) -> Vec<CommunitySummary> {
        let communities = self.communities.read().await;
        let mut summaries: Vec<CommunitySummary> = communities
            .values()
            .map(|c| CommunitySummary {
                id: c.id.clone(),
                name: c.name.clone(),
                description: c.description.clone(),
                requirements: c.requirements.clone(),
                total_members: c.members.total(),
                created_at: c.created_at.clone(),
            })
            .collect();
        summaries.sort_by(|a, b| a.id.cmp(&b.id));
        summaries
    }

    pub async fn count(&self) -> usize {
        self.communities.read().await.len()
    }
}

impl Default for CommunityStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Id derived from creation time and a digest of the name.
/// Not guaranteed globally unique, but collisions need the same clock
/// second and the same name digest prefix, which is fine process-locally.
fn community_id(name: &str) -> String {
    let digest = Sha256::digest(name.as_bytes());
    format!("community_{}_{}", Utc::now().timestamp(), &hex::encode(digest)[..8])
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store_with_community(caller: Option<&str>) -> (CommunityStore, String) {
        let store = CommunityStore::new();
        let community = store
            .create(
                "Test DAO",
                "a test community",
                Some("TokenMint111".into()),
                5.0,
                TokenType::Fungible,
                None,
                caller,
            )
            .await
            .unwrap();
        let id = community.id;
        (store, id)
    }

    #[tokio::test]
    async fn test_create_requires_name() {
        let store = CommunityStore::new();
        let err = store
            .create("", "", Some("mint".into()), 1.0, TokenType::Fungible, None, None)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("name is required"));
    }

    #[tokio::test]
    async fn test_create_requires_gating_asset() {
        let store = CommunityStore::new();
        let err = store
            .create("DAO", "", None, 1.0, TokenType::Fungible, None, None)
            .await
            .unwrap_err();
        assert!(err
            .to_string()
            .contains("Either token_address or nft_collection_address is required"));
    }

    #[tokio::test]
    async fn test_creator_becomes_admin() {
        let (store, id) = store_with_community(Some("creator")).await;
        assert_eq!(
            store.member_role(&id, "creator").await.unwrap(),
            Some(AccessLevel::Admin)
        );
    }

    #[tokio::test]
    async fn test_configure_unknown_community() {
        let store = CommunityStore::new();
        let err = store
            .configure_requirements("community_0_deadbeef", RequirementsUpdate::default(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, GateError::CommunityNotFound(_)));
        assert_eq!(store.count().await, 0);
    }

    #[tokio::test]
    async fn test_configure_partial_update() {
        let (store, id) = store_with_community(Some("creator")).await;
        let update = RequirementsUpdate {
            min_token_amount: Some(25.0),
            ..Default::default()
        };
        let req = store
            .configure_requirements(&id, update, Some("creator"))
            .await
            .unwrap();
        assert_eq!(req.min_token_amount, 25.0);
        // untouched fields survive
        assert_eq!(req.token_address.as_deref(), Some("TokenMint111"));
        assert_eq!(req.token_type, TokenType::Fungible);
    }

    #[tokio::test]
    async fn test_configure_rejects_non_admin() {
        let (store, id) = store_with_community(Some("creator")).await;
        let err = store
            .configure_requirements(&id, RequirementsUpdate::default(), Some("intruder"))
            .await
            .unwrap_err();
        assert!(matches!(err, GateError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_configure_rejects_anonymous_when_owned() {
        let (store, id) = store_with_community(Some("creator")).await;
        let err = store
            .configure_requirements(&id, RequirementsUpdate::default(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, GateError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_configure_allowed_on_adminless_community() {
        let (store, id) = store_with_community(None).await;
        let update = RequirementsUpdate {
            token_type: Some(TokenType::Nft),
            nft_collection_address: Some("Collection111".into()),
            ..Default::default()
        };
        let req = store.configure_requirements(&id, update, None).await.unwrap();
        assert_eq!(req.token_type, TokenType::Nft);
    }

    #[tokio::test]
    async fn test_add_member_then_status() {
        let (store, id) = store_with_community(Some("creator")).await;
        let update = store
            .add_member(&id, "walletB", AccessLevel::Member, None)
            .await
            .unwrap();
        assert!(!update.already_present);
        assert_eq!(update.total_members, 2);
        assert_eq!(
            store.member_role(&id, "walletB").await.unwrap(),
            Some(AccessLevel::Member)
        );
    }

    #[tokio::test]
    async fn test_add_member_moderator_requires_admin() {
        let (store, id) = store_with_community(Some("creator")).await;

        let err = store
            .add_member(&id, "walletB", AccessLevel::Moderator, Some("walletB"))
            .await
            .unwrap_err();
        assert!(matches!(err, GateError::Unauthorized(_)));

        let err = store
            .add_member(&id, "walletB", AccessLevel::Moderator, None)
            .await
            .unwrap_err();
        assert!(matches!(err, GateError::Unauthorized(_)));

        store
            .add_member(&id, "walletB", AccessLevel::Moderator, Some("creator"))
            .await
            .unwrap();
        assert_eq!(
            store.member_role(&id, "walletB").await.unwrap(),
            Some(AccessLevel::Moderator)
        );
    }

    #[tokio::test]
    async fn test_add_member_moves_between_roles() {
        let (store, id) = store_with_community(Some("creator")).await;
        store
            .add_member(&id, "walletB", AccessLevel::Member, None)
            .await
            .unwrap();
        store
            .add_member(&id, "walletB", AccessLevel::Admin, Some("creator"))
            .await
            .unwrap();

        let roster = store.members(&id).await.unwrap();
        assert_eq!(roster.role_of("walletB"), Some(AccessLevel::Admin));
        assert!(roster.members.is_empty());
        assert_eq!(roster.total(), 2);
    }

    #[tokio::test]
    async fn test_add_member_same_role_is_noop() {
        let (store, id) = store_with_community(Some("creator")).await;
        store
            .add_member(&id, "walletB", AccessLevel::Member, None)
            .await
            .unwrap();
        let update = store
            .add_member(&id, "walletB", AccessLevel::Member, None)
            .await
            .unwrap();
        assert!(update.already_present);
        assert_eq!(update.total_members, 2);
    }

    #[tokio::test]
    async fn test_remove_member() {
        let (store, id) = store_with_community(Some("creator")).await;
        store
            .add_member(&id, "walletB", AccessLevel::Member, None)
            .await
            .unwrap();
        let removed_from = store.remove_member(&id, "walletB").await.unwrap();
        assert_eq!(removed_from, AccessLevel::Member);
        assert_eq!(store.member_role(&id, "walletB").await.unwrap(), None);

        let err = store.remove_member(&id, "walletB").await.unwrap_err();
        assert!(err.to_string().contains("not a member"));
    }

    #[tokio::test]
    async fn test_stats_recompute_total_members() {
        let (store, id) = store_with_community(Some("creator")).await;
        store
            .add_member(&id, "walletB", AccessLevel::Member, None)
            .await
            .unwrap();
        store
            .add_member(&id, "walletC", AccessLevel::Moderator, Some("creator"))
            .await
            .unwrap();

        let (_, report) = store.stats(&id).await.unwrap();
        assert_eq!(report.total_members, 3);
        assert_eq!(report.admin_count, 1);
        assert_eq!(report.moderator_count, 1);
        assert_eq!(report.member_count, 1);
    }

    #[tokio::test]
    async fn test_access_counters() {
        let (store, id) = store_with_community(Some("creator")).await;
        store.record_access_attempt(&id, true).await.unwrap();
        store.record_access_attempt(&id, false).await.unwrap();
        store.record_access_attempt(&id, false).await.unwrap();

        let (_, report) = store.stats(&id).await.unwrap();
        assert_eq!(report.access_requests, 3);
        assert_eq!(report.access_granted, 1);
        assert_eq!(report.access_denied, 2);
    }

    #[tokio::test]
    async fn test_list_summaries() {
        let (store, id) = store_with_community(Some("creator")).await;
        let summaries = store.list().await;
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].id, id);
        assert_eq!(summaries[0].name, "Test DAO");
        assert_eq!(summaries[0].total_members, 1);
    }

    #[test]
    fn test_community_id_shape() {
        let id = community_id("Test DAO");
        assert!(id.starts_with("community_"));
        let parts: Vec<&str> = id.rsplitn(2, '_').collect();
        assert_eq!(parts[0].len(), 8);
    }
}
