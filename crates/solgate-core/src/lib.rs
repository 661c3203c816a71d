//! ============================================================================
//! SOLGATE-CORE: Token-Gated Community Access Control
//! ============================================================================
//! This crate handles all backend logic for token-gated communities:
//! - In-memory community records, roles, and access statistics
//! - TTL-cached verification of wallet token/NFT holdings
//! - Time-limited access credentials (issue + validate)
//! - Action dispatcher with a uniform result envelope for agent frameworks
//! ============================================================================

pub mod access;
pub mod community;
pub mod config;
pub mod holdings;
pub mod registry;
pub mod tool;
pub mod types;
pub mod wallet;

// Re-export main types for convenience
pub use access::{AccessVerification, AccessVerifier, IssuedToken, TokenIssuer, TokenValidation};
pub use community::{AccessLevel, AccessRequirements, Community, CommunityStore, TokenType};
pub use config::GateConfig;
pub use holdings::{HoldingsProvider, IndexerHoldings, RpcHoldings, SimulatedHoldings};
pub use registry::{Tool, ToolRegistry};
pub use tool::CommunityGateTool;
pub use types::{Blockchain, GateAction, GateError, ToolResult, ToolStatus};
pub use wallet::{is_valid_address, WalletContext};
