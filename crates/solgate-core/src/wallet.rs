//! ============================================================================
//! Wallet Context - Caller identity and address validation
//! ============================================================================
//! Loads the caller's keypair so authorization checks (admin-only
//! operations) know who is calling. Without a loaded wallet the caller is
//! anonymous and admin-gated operations are denied.
//! ============================================================================

use solana_sdk::signature::Keypair;
use solana_sdk::signer::Signer;
use tracing::info;

use crate::types::{Blockchain, GateError};

/// Caller identity for authorization checks
pub struct WalletContext {
    keypair: Option<Keypair>,
    address: Option<String>,
}

impl WalletContext {
    /// No wallet loaded; admin-gated operations will be denied
    pub fn anonymous() -> Self {
        Self {
            keypair: None,
            address: None,
        }
    }

    /// Load a keypair from a JSON byte-array file (keys never leave the process)
    pub fn load(keypair_path: &str) -> Result<Self, GateError> {
        let keypair_data = std::fs::read_to_string(keypair_path)
            .map_err(|e| GateError::External(format!("Failed to read keypair: {}", e)))?;

        let bytes: Vec<u8> = serde_json::from_str(&keypair_data)
            .map_err(|e| GateError::External(format!("Failed to parse keypair: {}", e)))?;

        let keypair = Keypair::try_from(bytes.as_slice())
            .map_err(|e| GateError::External(format!("Invalid keypair bytes: {}", e)))?;

        let address = keypair.pubkey().to_string();
        info!("Loaded wallet: {}", address);

        Ok(Self {
            keypair: Some(keypair),
            address: Some(address),
        })
    }

    pub fn from_keypair(keypair: Keypair) -> Self {
        let address = keypair.pubkey().to_string();
        Self {
            keypair: Some(keypair),
            address: Some(address),
        }
    }

    /// Fixed address identity without key material (e.g. watch-only callers)
    pub fn from_address(address: &str) -> Self {
        Self {
            keypair: None,
            address: Some(address.to_string()),
        }
    }

    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    pub fn has_signer(&self) -> bool {
        self.keypair.is_some()
    }
}

/// Address shape check for the supported chains.
/// Solana addresses are base58 of 32 bytes; Ethereum and Polygon addresses
/// are 0x followed by 40 hex characters.
pub fn is_valid_address(address: &str, blockchain: Blockchain) -> bool {
    if address.is_empty() {
        return false;
    }
    match blockchain {
        Blockchain::Solana => bs58::decode(address)
            .into_vec()
            .map(|bytes| bytes.len() == 32)
            .unwrap_or(false),
        Blockchain::Ethereum | Blockchain::Polygon => {
            address.len() == 42
                && address.starts_with("0x")
                && address[2..].chars().all(|c| c.is_ascii_hexdigit())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anonymous_context() {
        let ctx = WalletContext::anonymous();
        assert_eq!(ctx.address(), None);
        assert!(!ctx.has_signer());
    }

    #[test]
    fn test_from_address() {
        let ctx = WalletContext::from_address("walletA");
        assert_eq!(ctx.address(), Some("walletA"));
        assert!(!ctx.has_signer());
    }

    #[test]
    fn test_from_keypair() {
        let ctx = WalletContext::from_keypair(Keypair::new());
        assert!(ctx.has_signer());
        assert!(is_valid_address(ctx.address().unwrap(), Blockchain::Solana));
    }

    #[test]
    fn test_load_missing_file() {
        let err = WalletContext::load("/nonexistent/keypair.json").unwrap_err();
        assert!(err.to_string().contains("Failed to read keypair"));
    }

    #[test]
    fn test_solana_address_validation() {
        assert!(is_valid_address(
            "So11111111111111111111111111111111111111112",
            Blockchain::Solana
        ));
        assert!(!is_valid_address("tooshort", Blockchain::Solana));
        assert!(!is_valid_address("", Blockchain::Solana));
        assert!(!is_valid_address("0OIl+/", Blockchain::Solana));
    }

    #[test]
    fn test_evm_address_validation() {
        assert!(is_valid_address(
            "0x52908400098527886E0F7030069857D2E4169EE7",
            Blockchain::Ethereum
        ));
        assert!(is_valid_address(
            "0x52908400098527886e0f7030069857d2e4169ee7",
            Blockchain::Polygon
        ));
        assert!(!is_valid_address(
            "52908400098527886E0F7030069857D2E4169EE7",
            Blockchain::Ethereum
        ));
        assert!(!is_valid_address("0x1234", Blockchain::Ethereum));
        assert!(!is_valid_address(
            "0xZZ908400098527886E0F7030069857D2E4169EE7",
            Blockchain::Ethereum
        ));
    }
}
