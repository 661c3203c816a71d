//! ============================================================================
//! Core Types for Solgate
//! ============================================================================
//! Defines the action enum, the uniform tool result envelope, and the error
//! taxonomy shared by every operation. All payloads are serialized to JSON
//! for the surrounding agent framework.
//! ============================================================================

use serde::{Deserialize, Serialize};

/// Actions accepted by the token-gated community dispatcher
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateAction {
    CreateCommunity,
    ConfigureRequirements,
    VerifyAccess,
    GenerateAccessToken,
    VerifyToken,
    ListCommunities,
    GetCommunityStats,
    AddMember,
    RemoveMember,
    CheckMemberStatus,
    GetMembers,
}

impl GateAction {
    /// Every dispatchable action, in the order the tool documents them
    pub const ALL: &'static [GateAction] = &[
        GateAction::CreateCommunity,
        GateAction::ConfigureRequirements,
        GateAction::VerifyAccess,
        GateAction::GenerateAccessToken,
        GateAction::VerifyToken,
        GateAction::ListCommunities,
        GateAction::GetCommunityStats,
        GateAction::AddMember,
        GateAction::RemoveMember,
        GateAction::CheckMemberStatus,
        GateAction::GetMembers,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GateAction::CreateCommunity => "create_community",
            GateAction::ConfigureRequirements => "configure_requirements",
            GateAction::VerifyAccess => "verify_access",
            GateAction::GenerateAccessToken => "generate_access_token",
            GateAction::VerifyToken => "verify_token",
            GateAction::ListCommunities => "list_communities",
            GateAction::GetCommunityStats => "get_community_stats",
            GateAction::AddMember => "add_member",
            GateAction::RemoveMember => "remove_member",
            GateAction::CheckMemberStatus => "check_member_status",
            GateAction::GetMembers => "get_members",
        }
    }
}

impl std::fmt::Display for GateAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for GateAction {
    type Err = GateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GateAction::ALL
            .iter()
            .copied()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| GateError::UnknownAction(s.to_string()))
    }
}

/// Blockchain network a verification runs against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Blockchain {
    #[default]
    Solana,
    Ethereum,
    Polygon,
}

impl Blockchain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Blockchain::Solana => "solana",
            Blockchain::Ethereum => "ethereum",
            Blockchain::Polygon => "polygon",
        }
    }
}

impl std::fmt::Display for Blockchain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Blockchain {
    type Err = GateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "solana" => Ok(Blockchain::Solana),
            "ethereum" => Ok(Blockchain::Ethereum),
            "polygon" => Ok(Blockchain::Polygon),
            _ => Err(GateError::Validation(format!("Unknown blockchain: {}", s))),
        }
    }
}

/// Result envelope status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolStatus {
    Success,
    Error,
}

/// Uniform result envelope returned by every tool operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    pub status: ToolStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ToolResult {
    pub fn success(result: serde_json::Value) -> Self {
        Self {
            status: ToolStatus::Success,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: ToolStatus::Error,
            result: None,
            error: Some(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ToolStatus::Success
    }
}

impl From<Result<serde_json::Value, GateError>> for ToolResult {
    fn from(res: Result<serde_json::Value, GateError>) -> Self {
        match res {
            Ok(value) => ToolResult::success(value),
            Err(e) => ToolResult::error(e.to_string()),
        }
    }
}

/// Error taxonomy for the token-gated community subsystem.
/// Every variant is converted to the error envelope at the dispatch
/// boundary; none is fatal to the process.
#[derive(Debug, Clone, thiserror::Error)]
pub enum GateError {
    /// Missing or malformed parameter
    #[error("{0}")]
    Validation(String),

    #[error("Community with ID {0} not found")]
    CommunityNotFound(String),

    #[error("Invalid access token")]
    UnknownToken,

    #[error("Access token has expired")]
    TokenExpired,

    #[error("Community no longer exists")]
    CommunityGone,

    /// Caller lacks the required role
    #[error("{0}")]
    Unauthorized(String),

    #[error("Wallet does not have access to this community")]
    AccessDenied,

    #[error("Unknown token-gated community action: {0}")]
    UnknownAction(String),

    /// Network or SDK failure, wrapped with the underlying message
    #[error("{0}")]
    External(String),
}
