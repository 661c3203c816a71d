//! ============================================================================
//! Community Gate Tool - Action dispatcher
//! ============================================================================
//! Routes a named action plus flat JSON parameters to the community store,
//! access verifier, or token issuer, and wraps every outcome in the uniform
//! result envelope. Every error is caught here; nothing propagates to the
//! surrounding agent framework and nothing is retried.
//! ============================================================================

use std::str::FromStr;
use std::sync::Arc;

use chrono::Utc;
use serde_json::{json, Value};
use tracing::{error, info};

use crate::access::{AccessVerifier, TokenIssuer};
use crate::community::{AccessLevel, CommunityStore, RequirementsUpdate, TokenType};
use crate::config::GateConfig;
use crate::holdings::HoldingsProvider;
use crate::registry::Tool;
use crate::types::{Blockchain, GateAction, GateError, ToolResult};
use crate::wallet::WalletContext;

pub const TOOL_NAME: &str = "token_gated_community";

const TOOL_DESCRIPTION: &str =
    "Manage token-gated communities, verify token holdings, and control access to exclusive spaces";

/// Token-gated community tool: one instance owns all community, cache, and
/// token state for the lifetime of the process.
pub struct CommunityGateTool {
    config: GateConfig,
    store: Arc<CommunityStore>,
    verifier: Arc<AccessVerifier>,
    issuer: TokenIssuer,
    wallet: WalletContext,
}

impl CommunityGateTool {
    pub fn new(
        config: GateConfig,
        provider: Arc<dyn HoldingsProvider>,
        wallet: WalletContext,
    ) -> Self {
        let store = Arc::new(CommunityStore::new());
        let verifier = Arc::new(AccessVerifier::with_cache_ttl(
            store.clone(),
            provider,
            config.cache_ttl_secs,
        ));
        let issuer = TokenIssuer::new(store.clone(), verifier.clone());

        Self {
            config,
            store,
            verifier,
            issuer,
            wallet,
        }
    }

    pub fn store(&self) -> &Arc<CommunityStore> {
        &self.store
    }

    pub fn verifier(&self) -> &Arc<AccessVerifier> {
        &self.verifier
    }

    pub fn issuer(&self) -> &TokenIssuer {
        &self.issuer
    }

    /// Execute a named action. This is the single entry point used by the
    /// agent framework; the result envelope is the only thing that escapes.
    pub async fn execute(&self, action: &str, params: &Value) -> ToolResult {
        let action = match GateAction::from_str(action) {
            Ok(action) => action,
            Err(e) => {
                error!("{}", e);
                return ToolResult::error(e.to_string());
            }
        };

        match self.dispatch(action, params).await {
            Ok(result) => ToolResult::success(result),
            Err(e) => {
                error!("Error executing {} action: {}", action, e);
                ToolResult::error(e.to_string())
            }
        }
    }

    async fn dispatch(&self, action: GateAction, params: &Value) -> Result<Value, GateError> {
        info!("Executing action: {}", action);

        match action {
            GateAction::CreateCommunity => self.create_community(params).await,
            GateAction::ConfigureRequirements => self.configure_requirements(params).await,
            GateAction::VerifyAccess => self.verify_access(params).await,
            GateAction::GenerateAccessToken => self.generate_access_token(params).await,
            GateAction::VerifyToken => self.verify_token(params).await,
            GateAction::ListCommunities => self.list_communities().await,
            GateAction::GetCommunityStats => self.get_community_stats(params).await,
            GateAction::AddMember => self.add_member(params).await,
            GateAction::RemoveMember => self.remove_member(params).await,
            GateAction::CheckMemberStatus => self.check_member_status(params).await,
            GateAction::GetMembers => self.get_members(params).await,
        }
    }

    async fn create_community(&self, params: &Value) -> Result<Value, GateError> {
        let name = opt_str(params, "community_name").unwrap_or_default();
        let description = opt_str(params, "description").unwrap_or_default();
        let token_type = parse_token_type(params)?.unwrap_or_default();
        let min_token_amount = opt_f64(params, "min_token_amount").unwrap_or(1.0);

        let community = self
            .store
            .create(
                &name,
                &description,
                opt_str(params, "token_address"),
                min_token_amount,
                token_type,
                opt_str(params, "nft_collection_address"),
                self.wallet.address(),
            )
            .await?;

        Ok(json!({
            "community_id": community.id,
            "name": community.name,
            "requirements": community.requirements,
            "created_at": community.created_at,
            "message": "Community created successfully",
        }))
    }

    async fn configure_requirements(&self, params: &Value) -> Result<Value, GateError> {
        let community_id = require_str(params, "community_id")?;
        let update = RequirementsUpdate {
            token_type: parse_token_type(params)?,
            token_address: opt_str(params, "token_address"),
            min_token_amount: opt_f64(params, "min_token_amount"),
            nft_collection_address: opt_str(params, "nft_collection_address"),
        };

        let requirements = self
            .store
            .configure_requirements(&community_id, update, self.wallet.address())
            .await?;

        Ok(json!({
            "community_id": community_id,
            "requirements": requirements,
            "updated_at": Utc::now().to_rfc3339(),
            "message": "Community requirements updated successfully",
        }))
    }

    async fn verify_access(&self, params: &Value) -> Result<Value, GateError> {
        let community_id = require_str(params, "community_id")?;
        let wallet_address = require_str(params, "wallet_address")?;
        let blockchain = parse_blockchain(params)?;

        let verification = self
            .verifier
            .verify_access(&community_id, &wallet_address, blockchain)
            .await?;
        serde_json::to_value(verification)
            .map_err(|e| GateError::External(format!("Failed to encode result: {}", e)))
    }

    async fn generate_access_token(&self, params: &Value) -> Result<Value, GateError> {
        let community_id = require_str(params, "community_id")?;
        let wallet_address = require_str(params, "wallet_address")?;
        let access_level = parse_access_level(params)?.unwrap_or_default();
        let expiration = opt_i64(params, "token_expiration")
            .unwrap_or(self.config.default_token_expiration_secs);

        let issued = self
            .issuer
            .generate(&community_id, &wallet_address, access_level, expiration)
            .await?;

        let mut result = serde_json::to_value(issued)
            .map_err(|e| GateError::External(format!("Failed to encode result: {}", e)))?;
        if let Some(map) = result.as_object_mut() {
            map.insert(
                "message".into(),
                Value::String("Access token generated successfully".into()),
            );
        }
        Ok(result)
    }

    async fn verify_token(&self, params: &Value) -> Result<Value, GateError> {
        let access_token = require_str(params, "access_token")
            .map_err(|_| GateError::Validation("Access token is required".into()))?;
        let validation = self.issuer.verify(&access_token).await?;
        serde_json::to_value(validation)
            .map_err(|e| GateError::External(format!("Failed to encode result: {}", e)))
    }

    async fn list_communities(&self) -> Result<Value, GateError> {
        let communities = self.store.list().await;
        Ok(json!({
            "communities": communities,
            "count": communities.len(),
            "timestamp": Utc::now().to_rfc3339(),
        }))
    }

    async fn get_community_stats(&self, params: &Value) -> Result<Value, GateError> {
        let community_id = require_str(params, "community_id")?;
        let (community, report) = self.store.stats(&community_id).await?;

        Ok(json!({
            "community_id": community.id,
            "name": community.name,
            "stats": report,
            "requirements": community.requirements,
            "created_at": community.created_at,
            "timestamp": Utc::now().to_rfc3339(),
        }))
    }

    async fn add_member(&self, params: &Value) -> Result<Value, GateError> {
        let community_id = require_str(params, "community_id")?;
        let wallet_address = require_str(params, "wallet_address")?;
        let access_level = parse_access_level(params)?.unwrap_or_default();

        let update = self
            .store
            .add_member(
                &community_id,
                &wallet_address,
                access_level,
                self.wallet.address(),
            )
            .await?;

        let message = if update.already_present {
            format!("Wallet is already a {} of this community", access_level)
        } else {
            "Member added successfully".to_string()
        };

        Ok(json!({
            "community_id": community_id,
            "wallet_address": update.wallet_address,
            "access_level": update.access_level,
            "total_members": update.total_members,
            "message": message,
        }))
    }

    async fn remove_member(&self, params: &Value) -> Result<Value, GateError> {
        let community_id = require_str(params, "community_id")?;
        let wallet_address = require_str(params, "wallet_address")?;

        let removed_from = self
            .store
            .remove_member(&community_id, &wallet_address)
            .await?;

        Ok(json!({
            "community_id": community_id,
            "wallet_address": wallet_address,
            "removed_from": removed_from,
            "message": "Member removed successfully",
        }))
    }

    async fn check_member_status(&self, params: &Value) -> Result<Value, GateError> {
        let community_id = require_str(params, "community_id")?;
        let wallet_address = require_str(params, "wallet_address")?;

        let role = self.store.member_role(&community_id, &wallet_address).await?;

        Ok(json!({
            "community_id": community_id,
            "wallet_address": wallet_address,
            "is_member": role.is_some(),
            "access_level": role,
        }))
    }

    async fn get_members(&self, params: &Value) -> Result<Value, GateError> {
        let community_id = require_str(params, "community_id")?;
        let roster = self.store.members(&community_id).await?;

        match parse_access_level(params)? {
            Some(level) => {
                let members = roster.bucket(level).clone();
                Ok(json!({
                    "community_id": community_id,
                    "access_level": level,
                    "count": members.len(),
                    "members": members,
                }))
            }
            None => Ok(json!({
                "community_id": community_id,
                "total_members": roster.total(),
                "members": roster,
            })),
        }
    }
}

#[async_trait::async_trait]
impl Tool for CommunityGateTool {
    fn name(&self) -> &str {
        TOOL_NAME
    }

    fn description(&self) -> &str {
        TOOL_DESCRIPTION
    }

    async fn execute(&self, action: &str, params: &Value) -> ToolResult {
        CommunityGateTool::execute(self, action, params).await
    }
}

// ============================================================================
// Parameter extraction
// ============================================================================

fn opt_str(params: &Value, key: &str) -> Option<String> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
}

fn require_str(params: &Value, key: &str) -> Result<String, GateError> {
    opt_str(params, key)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| GateError::Validation(format!("Missing required parameter: {}", key)))
}

fn opt_f64(params: &Value, key: &str) -> Option<f64> {
    params.get(key).and_then(|v| v.as_f64())
}

fn opt_i64(params: &Value, key: &str) -> Option<i64> {
    params.get(key).and_then(|v| v.as_i64())
}

fn parse_token_type(params: &Value) -> Result<Option<TokenType>, GateError> {
    opt_str(params, "token_type")
        .map(|s| TokenType::from_str(&s).map_err(GateError::Validation))
        .transpose()
}

fn parse_access_level(params: &Value) -> Result<Option<AccessLevel>, GateError> {
    opt_str(params, "access_level")
        .map(|s| AccessLevel::from_str(&s).map_err(GateError::Validation))
        .transpose()
}

fn parse_blockchain(params: &Value) -> Result<Blockchain, GateError> {
    match opt_str(params, "blockchain") {
        Some(s) => Blockchain::from_str(&s),
        None => Ok(Blockchain::Solana),
    }
}
