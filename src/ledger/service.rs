//! Transaction store - append-only simulated ledger

use chrono::Utc;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{broadcast, RwLock};
use uuid::Uuid;

use crate::ledger::{
    ChainVerification, LedgerEvent, NewTransaction, Transaction, TransactionStatus,
    GENESIS_HASH,
};
use crate::storage::{keys, load_or_default, save_json, Storage, StorageError};

/// Ledger errors
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Transaction not found: {0}")]
    NotFound(Uuid),

    #[error("Transaction {id} is already {status:?}")]
    AlreadySettled { id: Uuid, status: TransactionStatus },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Append-only log of simulated ledger entries
pub struct TransactionStore {
    storage: Arc<dyn Storage>,
    transactions: RwLock<Vec<Transaction>>,
    events: broadcast::Sender<LedgerEvent>,
}

impl TransactionStore {
    /// Load the log from storage
    pub fn load(storage: Arc<dyn Storage>) -> Self {
        let transactions: Vec<Transaction> = load_or_default(storage.as_ref(), keys::TRANSACTIONS);
        tracing::info!(count = transactions.len(), "Loaded ledger");

        let (events, _rx) = broadcast::channel(256);
        Self {
            storage,
            transactions: RwLock::new(transactions),
            events,
        }
    }

    /// Subscribe to appended entries and status changes
    pub fn subscribe(&self) -> broadcast::Receiver<LedgerEvent> {
        self.events.subscribe()
    }

    /// Append a new entry, assigning its block number and chained hash
    pub async fn append(&self, new_tx: NewTransaction) -> Result<Transaction, LedgerError> {
        let mut transactions = self.transactions.write().await;

        let previous_hash = transactions
            .last()
            .map(|tx| tx.block_hash.clone())
            .unwrap_or_else(|| GENESIS_HASH.to_string());

        let mut tx = Transaction {
            id: Uuid::new_v4(),
            tx_type: new_tx.tx_type,
            from: new_tx.from,
            to: new_tx.to,
            amount: new_tx.amount,
            product_id: new_tx.product_id,
            order_id: new_tx.order_id,
            initiator_id: new_tx.initiator_id,
            vendor_ids: new_tx.vendor_ids,
            timestamp: Utc::now(),
            block_number: transactions.len() as u64 + 1,
            block_hash: String::new(),
            status: new_tx.status,
        };
        tx.block_hash = tx.compute_hash(&previous_hash);

        transactions.push(tx.clone());
        if let Err(e) = save_json(self.storage.as_ref(), keys::TRANSACTIONS, &*transactions) {
            transactions.pop();
            return Err(e.into());
        }

        tracing::info!(
            tx_id = %tx.id,
            tx_type = tx.tx_type.as_str(),
            amount = %tx.amount,
            block = tx.block_number,
            "Ledger entry appended"
        );

        let _ = self.events.send(LedgerEvent::Appended {
            transaction: tx.clone(),
        });

        Ok(tx)
    }

    /// Mark a pending entry as confirmed
    pub async fn confirm(&self, id: Uuid) -> Result<Transaction, LedgerError> {
        self.settle(id, TransactionStatus::Confirmed).await
    }

    /// Mark a pending entry as failed
    pub async fn fail(&self, id: Uuid) -> Result<Transaction, LedgerError> {
        self.settle(id, TransactionStatus::Failed).await
    }

    async fn settle(&self, id: Uuid, status: TransactionStatus) -> Result<Transaction, LedgerError> {
        let mut transactions = self.transactions.write().await;

        let index = transactions
            .iter()
            .position(|tx| tx.id == id)
            .ok_or(LedgerError::NotFound(id))?;

        let current = transactions[index].status;
        if current.is_terminal() {
            return Err(LedgerError::AlreadySettled {
                id,
                status: current,
            });
        }

        transactions[index].status = status;
        if let Err(e) = save_json(self.storage.as_ref(), keys::TRANSACTIONS, &*transactions) {
            transactions[index].status = current;
            return Err(e.into());
        }

        tracing::info!(tx_id = %id, status = ?status, "Ledger entry settled");
        let settled = transactions[index].clone();
        let _ = self.events.send(LedgerEvent::StatusChanged {
            transaction: settled.clone(),
        });

        Ok(settled)
    }

    pub async fn get(&self, id: Uuid) -> Option<Transaction> {
        let transactions = self.transactions.read().await;
        transactions.iter().find(|tx| tx.id == id).cloned()
    }

    /// Whole log in block order
    pub async fn list(&self) -> Vec<Transaction> {
        self.transactions.read().await.clone()
    }

    /// Most recent entries first
    pub async fn recent(&self, limit: usize) -> Vec<Transaction> {
        let transactions = self.transactions.read().await;
        transactions.iter().rev().take(limit).cloned().collect()
    }

    /// Entries the user initiated or sells in
    pub async fn list_by_user(&self, user_id: Uuid) -> Vec<Transaction> {
        let transactions = self.transactions.read().await;
        transactions
            .iter()
            .filter(|tx| tx.involves(user_id))
            .cloned()
            .collect()
    }

    /// Entries sent from or to a wallet address
    pub async fn list_by_address(&self, address: &str) -> Vec<Transaction> {
        let transactions = self.transactions.read().await;
        transactions
            .iter()
            .filter(|tx| tx.touches_address(address))
            .cloned()
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.transactions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Re-hash every block and report the first mismatch
    pub async fn verify_chain(&self) -> ChainVerification {
        let transactions = self.transactions.read().await;
        let mut previous_hash = GENESIS_HASH.to_string();

        for tx in transactions.iter() {
            if tx.compute_hash(&previous_hash) != tx.block_hash {
                tracing::warn!(block = tx.block_number, "Ledger hash chain broken");
                return ChainVerification {
                    valid: false,
                    blocks: transactions.len() as u64,
                    broken_at: Some(tx.block_number),
                };
            }
            previous_hash = tx.block_hash.clone();
        }

        ChainVerification {
            valid: true,
            blocks: transactions.len() as u64,
            broken_at: None,
        }
    }
}
