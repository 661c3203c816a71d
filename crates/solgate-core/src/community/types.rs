//! ============================================================================
//! Community Types - Token-gated community records
//! ============================================================================
//! Defines community records, access requirements, membership rosters, and
//! per-community access statistics.
//! ============================================================================

use serde::{Deserialize, Serialize};

/// Kind of on-chain holding a community gates on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    /// Fungible token balance threshold
    #[default]
    Fungible,
    /// At least one NFT from a collection
    Nft,
    /// Combination of fungible and NFT conditions
    Multi,
}

impl TokenType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Fungible => "fungible",
            TokenType::Nft => "nft",
            TokenType::Multi => "multi",
        }
    }
}

impl std::fmt::Display for TokenType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TokenType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fungible" => Ok(TokenType::Fungible),
            "nft" => Ok(TokenType::Nft),
            "multi" => Ok(TokenType::Multi),
            _ => Err(format!("Unknown token type: {}", s)),
        }
    }
}

/// Membership role within a community
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AccessLevel {
    #[default]
    Member,
    Moderator,
    Admin,
}

impl AccessLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessLevel::Member => "member",
            AccessLevel::Moderator => "moderator",
            AccessLevel::Admin => "admin",
        }
    }
}

impl std::fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AccessLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "member" => Ok(AccessLevel::Member),
            "moderator" => Ok(AccessLevel::Moderator),
            "admin" => Ok(AccessLevel::Admin),
            _ => Err(format!("Invalid access level: {}", s)),
        }
    }
}

/// Token-holding requirement a wallet must satisfy for access
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessRequirements {
    pub token_type: TokenType,
    pub token_address: Option<String>,
    #[serde(default = "default_min_token_amount")]
    pub min_token_amount: f64,
    pub nft_collection_address: Option<String>,
}

fn default_min_token_amount() -> f64 {
    1.0
}

impl Default for AccessRequirements {
    fn default() -> Self {
        Self {
            token_type: TokenType::Fungible,
            token_address: None,
            min_token_amount: default_min_token_amount(),
            nft_collection_address: None,
        }
    }
}

/// Partial update applied by `configure_requirements`.
/// Only present fields overwrite the stored requirement.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequirementsUpdate {
    pub token_type: Option<TokenType>,
    pub token_address: Option<String>,
    pub min_token_amount: Option<f64>,
    pub nft_collection_address: Option<String>,
}

impl RequirementsUpdate {
    pub fn is_empty(&self) -> bool {
        self.token_type.is_none()
            && self.token_address.is_none()
            && self.min_token_amount.is_none()
            && self.nft_collection_address.is_none()
    }
}

/// Role buckets for a community.
/// Invariant: a wallet appears in at most one bucket at a time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemberRoster {
    pub admins: Vec<String>,
    pub moderators: Vec<String>,
    pub members: Vec<String>,
}

impl MemberRoster {
    /// Role of a wallet, if it belongs to any bucket
    pub fn role_of(&self, wallet: &str) -> Option<AccessLevel> {
        if self.admins.iter().any(|w| w == wallet) {
            Some(AccessLevel::Admin)
        } else if self.moderators.iter().any(|w| w == wallet) {
            Some(AccessLevel::Moderator)
        } else if self.members.iter().any(|w| w == wallet) {
            Some(AccessLevel::Member)
        } else {
            None
        }
    }

    pub fn bucket(&self, level: AccessLevel) -> &Vec<String> {
        match level {
            AccessLevel::Admin => &self.admins,
            AccessLevel::Moderator => &self.moderators,
            AccessLevel::Member => &self.members,
        }
    }

    fn bucket_mut(&mut self, level: AccessLevel) -> &mut Vec<String> {
        match level {
            AccessLevel::Admin => &mut self.admins,
            AccessLevel::Moderator => &mut self.moderators,
            AccessLevel::Member => &mut self.members,
        }
    }

    /// Remove a wallet from whichever bucket holds it
    pub fn remove(&mut self, wallet: &str) -> Option<AccessLevel> {
        let role = self.role_of(wallet)?;
        self.bucket_mut(role).retain(|w| w != wallet);
        Some(role)
    }

    /// Insert a wallet at the given level, moving it out of any other bucket.
    /// Returns true when the wallet was already at that level.
    pub fn assign(&mut self, wallet: &str, level: AccessLevel) -> bool {
        if self.role_of(wallet) == Some(level) {
            return true;
        }
        self.remove(wallet);
        self.bucket_mut(level).push(wallet.to_string());
        false
    }

    pub fn total(&self) -> u64 {
        (self.admins.len() + self.moderators.len() + self.members.len()) as u64
    }
}

/// Access counters for a community.
/// All counters are monotonically non-decreasing except `total_members`,
/// which is recomputed from the roster at read time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommunityStats {
    pub total_members: u64,
    pub access_requests: u64,
    pub access_granted: u64,
    pub access_denied: u64,
}

/// A token-gated community record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Community {
    pub id: String,
    pub name: String,
    pub description: String,
    /// RFC 3339 creation time
    pub created_at: String,
    /// Creator wallet address, or "anonymous" when no wallet was loaded
    pub created_by: String,
    pub requirements: AccessRequirements,
    pub members: MemberRoster,
    pub stats: CommunityStats,
}

/// Listing entry returned by `list_communities`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommunitySummary {
    pub id: String,
    pub name: String,
    pub description: String,
    pub requirements: AccessRequirements,
    pub total_members: u64,
    pub created_at: String,
}

/// Expanded statistics returned by `get_community_stats`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommunityStatsReport {
    pub total_members: u64,
    pub admin_count: u64,
    pub moderator_count: u64,
    pub member_count: u64,
    pub access_requests: u64,
    pub access_granted: u64,
    pub access_denied: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_type_parsing() {
        assert_eq!("fungible".parse::<TokenType>().unwrap(), TokenType::Fungible);
        assert_eq!("NFT".parse::<TokenType>().unwrap(), TokenType::Nft);
        assert_eq!("multi".parse::<TokenType>().unwrap(), TokenType::Multi);
        assert!("erc20".parse::<TokenType>().is_err());
    }

    #[test]
    fn test_access_level_parsing() {
        assert_eq!("member".parse::<AccessLevel>().unwrap(), AccessLevel::Member);
        assert_eq!("Moderator".parse::<AccessLevel>().unwrap(), AccessLevel::Moderator);
        assert_eq!("ADMIN".parse::<AccessLevel>().unwrap(), AccessLevel::Admin);
        assert!("owner".parse::<AccessLevel>().is_err());
    }

    #[test]
    fn test_roster_role_exclusivity() {
        let mut roster = MemberRoster::default();
        assert!(!roster.assign("walletA", AccessLevel::Member));
        assert_eq!(roster.role_of("walletA"), Some(AccessLevel::Member));

        // Promotion moves the wallet, it must not remain in the old bucket
        assert!(!roster.assign("walletA", AccessLevel::Moderator));
        assert_eq!(roster.role_of("walletA"), Some(AccessLevel::Moderator));
        assert!(roster.members.is_empty());
        assert_eq!(roster.total(), 1);
    }

    #[test]
    fn test_roster_reassign_same_level_is_noop() {
        let mut roster = MemberRoster::default();
        roster.assign("walletA", AccessLevel::Admin);
        assert!(roster.assign("walletA", AccessLevel::Admin));
        assert_eq!(roster.admins.len(), 1);
    }

    #[test]
    fn test_roster_remove() {
        let mut roster = MemberRoster::default();
        roster.assign("walletA", AccessLevel::Member);
        assert_eq!(roster.remove("walletA"), Some(AccessLevel::Member));
        assert_eq!(roster.remove("walletA"), None);
        assert_eq!(roster.total(), 0);
    }

    #[test]
    fn test_requirements_serde_defaults() {
        let req: AccessRequirements =
            serde_json::from_str(r#"{"token_type":"fungible","token_address":"So1","nft_collection_address":null}"#)
                .unwrap();
        assert_eq!(req.min_token_amount, 1.0);
    }
}
