//! ============================================================================
//! Access Tokens - Issuance and validation of time-limited credentials
//! ============================================================================
//! A credential is the base64 of its JSON record. It is NOT signed: validity
//! rests entirely on the token_id matching a server-held record, plus expiry
//! and the continued existence of the community. Expired records are removed
//! lazily on lookup and by the sweep.
//! ============================================================================

use std::collections::HashMap;
use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::{TimeZone, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::community::{AccessLevel, CommunityStore};
use crate::types::{Blockchain, GateError};

use super::verifier::AccessVerifier;

/// Default credential lifetime in seconds (24 hours)
pub const DEFAULT_TOKEN_EXPIRATION_SECS: i64 = 86_400;

/// Server-held token record; also the payload of the encoded credential
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenRecord {
    pub token_id: String,
    pub community_id: String,
    pub wallet_address: String,
    pub access_level: AccessLevel,
    pub issued_at: i64,
    pub expires_at: i64,
}

/// Response payload for a freshly issued credential
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssuedToken {
    pub access_token: String,
    pub token_id: String,
    pub community_id: String,
    pub wallet_address: String,
    pub access_level: AccessLevel,
    pub issued_at: String,
    pub expires_at: String,
}

/// Response payload for a successful validation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenValidation {
    pub token_id: String,
    pub is_valid: bool,
    pub community_id: String,
    pub wallet_address: String,
    pub access_level: AccessLevel,
    pub expires_at: String,
    pub time_remaining_seconds: i64,
}

/// Issues and validates access credentials against a process-wide store
pub struct TokenIssuer {
    tokens: RwLock<HashMap<String, AccessTokenRecord>>,
    communities: Arc<CommunityStore>,
    verifier: Arc<AccessVerifier>,
}

impl TokenIssuer {
    pub fn new(communities: Arc<CommunityStore>, verifier: Arc<AccessVerifier>) -> Self {
        Self {
            tokens: RwLock::new(HashMap::new()),
            communities,
            verifier,
        }
    }

    /// Issue a credential after a fresh (or cached) access verification
    pub async fn generate(
        &self,
        community_id: &str,
        wallet_address: &str,
        access_level: AccessLevel,
        expiration_secs: i64,
    ) -> Result<IssuedToken, GateError> {
        let verification = self
            .verifier
            .verify_access(community_id, wallet_address, Blockchain::Solana)
            .await?;
        if !verification.has_access {
            return Err(GateError::AccessDenied);
        }

        let now = Utc::now();
        let issued_at = now.timestamp();
        let expires_at = issued_at + expiration_secs;

        let token_id = hex::encode(Sha256::digest(
            format!(
                "{}_{}_{}",
                wallet_address,
                community_id,
                now.timestamp_micros()
            )
            .as_bytes(),
        ));

        let record = AccessTokenRecord {
            token_id: token_id.clone(),
            community_id: community_id.to_string(),
            wallet_address: wallet_address.to_string(),
            access_level,
            issued_at,
            expires_at,
        };

        let payload = serde_json::to_vec(&record)
            .map_err(|e| GateError::External(format!("Failed to encode token: {}", e)))?;
        let access_token = STANDARD.encode(payload);

        self.tokens
            .write()
            .await
            .insert(token_id.clone(), record);

        info!(
            "Issued {} token for {} in community {}",
            access_level, wallet_address, community_id
        );

        Ok(IssuedToken {
            access_token,
            token_id,
            community_id: community_id.to_string(),
            wallet_address: wallet_address.to_string(),
            access_level,
            issued_at: format_timestamp(issued_at),
            expires_at: format_timestamp(expires_at),
        })
    }

    /// Validate a credential: decode, record existence, expiry, community liveness.
    /// Expiry and the returned fields come from the server-held record, so a
    /// tampered payload with a known token_id gains nothing.
    pub async fn verify(&self, access_token: &str) -> Result<TokenValidation, GateError> {
        if access_token.is_empty() {
            return Err(GateError::Validation("Access token is required".into()));
        }

        let record = decode_credential(access_token)?;

        let now = Utc::now().timestamp();
        let stored = {
            let tokens = self.tokens.read().await;
            tokens
                .get(&record.token_id)
                .cloned()
                .ok_or(GateError::UnknownToken)?
        };

        if now > stored.expires_at {
            // Lazy reclamation: an expired record is dead weight
            self.tokens.write().await.remove(&stored.token_id);
            debug!("Purged expired token {}", stored.token_id);
            return Err(GateError::TokenExpired);
        }

        if !self.communities.contains(&stored.community_id).await {
            return Err(GateError::CommunityGone);
        }

        Ok(TokenValidation {
            token_id: stored.token_id.clone(),
            is_valid: true,
            community_id: stored.community_id.clone(),
            wallet_address: stored.wallet_address.clone(),
            access_level: stored.access_level,
            expires_at: format_timestamp(stored.expires_at),
            time_remaining_seconds: stored.expires_at - now,
        })
    }

    /// Sweep every expired record; returns how many were removed
    pub async fn purge_expired(&self) -> usize {
        let now = Utc::now().timestamp();
        let mut tokens = self.tokens.write().await;
        let before = tokens.len();
        tokens.retain(|_, record| record.expires_at >= now);
        let purged = before - tokens.len();
        if purged > 0 {
            info!("Purged {} expired access tokens", purged);
        }
        purged
    }

    pub async fn token_count(&self) -> usize {
        self.tokens.read().await.len()
    }
}

/// Decode failures are reported generically; content and transport errors
/// are indistinguishable to the caller.
fn decode_credential(access_token: &str) -> Result<AccessTokenRecord, GateError> {
    let bytes = STANDARD
        .decode(access_token)
        .map_err(|e| GateError::Validation(format!("Error verifying token: {}", e)))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| GateError::Validation(format!("Error verifying token: {}", e)))
}

fn format_timestamp(ts: i64) -> String {
    Utc.timestamp_opt(ts, 0)
        .single()
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_else(|| ts.to_string())
}
