//! Simulated wallet models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How the wallet came to be connected
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum WalletKind {
    New,
    Existing,
}

/// Locally booked wallet; the balance never goes negative
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Wallet {
    pub id: Uuid,
    pub owner_id: Uuid,
    #[serde(default)]
    pub owner_name: Option<String>,
    /// "0x" followed by 40 hex characters
    pub address: String,
    pub balance: Decimal,
    #[serde(rename = "type")]
    pub kind: WalletKind,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub connected_at: Option<DateTime<Utc>>,
}

/// Connection state of an owner's session
#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct WalletStatus {
    pub connected: bool,
    pub wallet: Option<Wallet>,
    /// Transfers still waiting for confirmation
    pub pending_transfers: usize,
}

impl WalletStatus {
    pub(crate) fn disconnected() -> Self {
        Self {
            connected: false,
            wallet: None,
            pending_transfers: 0,
        }
    }
}

/// Request DTO for creating a wallet
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CreateWalletRequest {
    pub owner_name: Option<String>,
}

/// Request DTO for a transfer
#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SendRequest {
    pub to: String,
    pub amount: Decimal,
    #[serde(default)]
    pub product_id: Option<Uuid>,
    #[serde(default)]
    pub order_id: Option<Uuid>,
}

/// Generate a mock address: "0x" + 40 random hex characters
pub fn generate_address() -> String {
    let bytes: [u8; 20] = rand::random();
    format!("0x{}", hex::encode(bytes))
}

/// Whether `address` has the mock address shape
pub fn is_valid_address(address: &str) -> bool {
    address
        .strip_prefix("0x")
        .map(|hex| hex.len() == 40 && hex.chars().all(|c| c.is_ascii_hexdigit()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_address_shape() {
        let address = generate_address();
        assert_eq!(address.len(), 42);
        assert!(is_valid_address(&address));
        assert_ne!(address, generate_address());
    }

    #[test]
    fn test_address_validation() {
        assert!(!is_valid_address("vendor_wallet_address"));
        assert!(!is_valid_address("0x1234"));
        assert!(!is_valid_address(&format!("0x{}", "g".repeat(40))));
    }

    #[test]
    fn test_wallet_type_field() {
        let wallet = Wallet {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            owner_name: None,
            address: generate_address(),
            balance: Decimal::from(5000),
            kind: WalletKind::New,
            created_at: Utc::now(),
            connected_at: None,
        };
        let json = serde_json::to_value(&wallet).unwrap();
        assert_eq!(json["type"], "new");
        assert!(json.get("ownerId").is_some());
    }
}
