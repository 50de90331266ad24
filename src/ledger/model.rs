//! Ledger entry models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Hash that precedes the first block
pub const GENESIS_HASH: &str = "0x0000000000000000000000000000000000000000000000000000000000000000";

/// Kind of simulated value movement
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Sale,
    Purchase,
    Transfer,
    Send,
    Receive,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Sale => "sale",
            TransactionType::Purchase => "purchase",
            TransactionType::Transfer => "transfer",
            TransactionType::Send => "send",
            TransactionType::Receive => "receive",
        }
    }
}

/// Confirmation state; only `Pending` may change
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Confirmed,
    Failed,
}

impl TransactionStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TransactionStatus::Pending)
    }
}

/// Append-only ledger entry
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub tx_type: TransactionType,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
    pub amount: Decimal,
    #[serde(default)]
    pub product_id: Option<Uuid>,
    #[serde(default)]
    pub order_id: Option<Uuid>,
    /// User that caused the entry (customer or wallet owner)
    #[serde(default)]
    pub initiator_id: Option<Uuid>,
    /// Vendors whose items the entry pays for
    #[serde(default)]
    pub vendor_ids: Vec<Uuid>,
    pub timestamp: DateTime<Utc>,
    pub block_number: u64,
    pub block_hash: String,
    pub status: TransactionStatus,
}

impl Transaction {
    /// Whether `user_id` is the initiator or one of the vendors
    pub fn involves(&self, user_id: Uuid) -> bool {
        self.initiator_id == Some(user_id) || self.vendor_ids.contains(&user_id)
    }

    /// Whether `address` is either side of the entry
    pub fn touches_address(&self, address: &str) -> bool {
        self.from.as_deref() == Some(address) || self.to.as_deref() == Some(address)
    }

    /// Hash over the immutable fields chained to the previous block
    pub fn compute_hash(&self, previous_hash: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(previous_hash.as_bytes());
        hasher.update(self.id.as_bytes());
        hasher.update(self.tx_type.as_str().as_bytes());
        hasher.update(self.from.as_deref().unwrap_or("").as_bytes());
        hasher.update(self.to.as_deref().unwrap_or("").as_bytes());
        hasher.update(self.amount.normalize().to_string().as_bytes());
        for id in [self.product_id, self.order_id, self.initiator_id] {
            match id {
                Some(id) => {
                    hasher.update([1u8]);
                    hasher.update(id.as_bytes());
                }
                None => hasher.update([0u8]),
            }
        }
        hasher.update((self.vendor_ids.len() as u64).to_be_bytes());
        for vendor_id in &self.vendor_ids {
            hasher.update(vendor_id.as_bytes());
        }
        hasher.update(self.block_number.to_be_bytes());
        hasher.update(self.timestamp.timestamp_micros().to_be_bytes());
        format!("0x{}", hex::encode(hasher.finalize()))
    }
}

/// Entry to append; the store assigns id, block and status-independent fields
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub tx_type: TransactionType,
    pub from: Option<String>,
    pub to: Option<String>,
    pub amount: Decimal,
    pub product_id: Option<Uuid>,
    pub order_id: Option<Uuid>,
    pub initiator_id: Option<Uuid>,
    pub vendor_ids: Vec<Uuid>,
    pub status: TransactionStatus,
}

impl NewTransaction {
    pub fn new(tx_type: TransactionType, amount: Decimal, status: TransactionStatus) -> Self {
        Self {
            tx_type,
            from: None,
            to: None,
            amount,
            product_id: None,
            order_id: None,
            initiator_id: None,
            vendor_ids: Vec::new(),
            status,
        }
    }
}

/// Ledger change published to subscribers
#[derive(Debug, Serialize, Clone)]
#[serde(tag = "type")]
pub enum LedgerEvent {
    Appended {
        transaction: Transaction,
    },
    /// Carries the entry after its status changed
    StatusChanged {
        transaction: Transaction,
    },
}

impl LedgerEvent {
    pub fn transaction(&self) -> &Transaction {
        match self {
            LedgerEvent::Appended { transaction } | LedgerEvent::StatusChanged { transaction } => {
                transaction
            }
        }
    }
}

/// Result of re-hashing the whole log
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChainVerification {
    pub valid: bool,
    pub blocks: u64,
    /// First block whose hash does not match
    pub broken_at: Option<u64>,
}
