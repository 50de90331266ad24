//! Wallet service - simulated wallets with delayed transfer confirmation

use chrono::Utc;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::config::WalletConfig;
use crate::ledger::{
    LedgerError, NewTransaction, Transaction, TransactionStatus, TransactionStore,
    TransactionType,
};
use crate::storage::{keys, load_json, load_or_default, save_json, Storage, StorageError};
use crate::wallet::{generate_address, is_valid_address, SendRequest, Wallet, WalletKind, WalletStatus};

/// Wallet errors
#[derive(Error, Debug)]
pub enum WalletError {
    #[error("Wallet not connected")]
    NotConnected,

    #[error("No wallet registered for user {0}")]
    WalletNotFound(Uuid),

    #[error("Amount must be greater than 0, got {0}")]
    InvalidAmount(Decimal),

    #[error("Invalid recipient address: {0}")]
    InvalidAddress(String),

    #[error("Insufficient balance: {balance} available, {amount} requested")]
    InsufficientBalance { balance: Decimal, amount: Decimal },

    #[error("Transfer is not pending: {0}")]
    TransferNotPending(Uuid),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

struct PendingTransfer {
    amount: Decimal,
    handle: JoinHandle<()>,
}

/// Connected wallet of one owner
struct Session {
    wallet_id: Uuid,
    /// Confirmations scheduled under an older generation are ignored
    generation: u64,
    pending: HashMap<Uuid, PendingTransfer>,
}

/// Wallet registry plus one session per owner
///
/// Lock order is `sessions` before `wallets`.
pub struct WalletService {
    storage: Arc<dyn Storage>,
    ledger: Arc<TransactionStore>,
    config: WalletConfig,
    wallets: RwLock<Vec<Wallet>>,
    sessions: Mutex<HashMap<Uuid, Session>>,
    generation: AtomicU64,
}

impl WalletService {
    pub fn load(
        storage: Arc<dyn Storage>,
        ledger: Arc<TransactionStore>,
        config: WalletConfig,
    ) -> Self {
        let wallets: Vec<Wallet> = load_or_default(storage.as_ref(), keys::WALLETS);
        tracing::info!(count = wallets.len(), "Loaded wallet registry");

        Self {
            storage,
            ledger,
            config,
            wallets: RwLock::new(wallets),
            sessions: Mutex::new(HashMap::new()),
            generation: AtomicU64::new(0),
        }
    }

    fn persist_wallets(&self, wallets: &[Wallet]) -> Result<(), StorageError> {
        save_json(self.storage.as_ref(), keys::WALLETS, wallets)
    }

    fn save_session(&self, wallet: &Wallet) -> Result<(), StorageError> {
        save_json(
            self.storage.as_ref(),
            &keys::wallet_session(wallet.owner_id),
            wallet,
        )
    }

    fn start_session(&self, sessions: &mut HashMap<Uuid, Session>, owner_id: Uuid, wallet_id: Uuid) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        sessions.insert(
            owner_id,
            Session {
                wallet_id,
                generation,
                pending: HashMap::new(),
            },
        );
    }

    /// Session of `owner_id`, restored from its persisted snapshot if needed
    async fn restore_session(
        &self,
        sessions: &mut HashMap<Uuid, Session>,
        owner_id: Uuid,
    ) -> Option<Uuid> {
        if let Some(session) = sessions.get(&owner_id) {
            return Some(session.wallet_id);
        }

        let snapshot: Wallet = load_json(self.storage.as_ref(), &keys::wallet_session(owner_id))?;
        let registered = {
            let wallets = self.wallets.read().await;
            wallets
                .iter()
                .any(|w| w.id == snapshot.id && w.owner_id == owner_id)
        };
        if !registered {
            tracing::warn!(owner = %owner_id, wallet_id = %snapshot.id, "Session wallet is not registered");
            return None;
        }

        self.start_session(sessions, owner_id, snapshot.id);
        tracing::debug!(owner = %owner_id, wallet_id = %snapshot.id, "Wallet session restored");
        Some(snapshot.id)
    }

    /// Create a wallet with the starting balance and connect it
    pub async fn create_new_wallet(
        &self,
        owner_id: Uuid,
        owner_name: Option<String>,
    ) -> Result<Wallet, WalletError> {
        self.disconnect_wallet(owner_id).await?;
        tokio::time::sleep(self.config.network_latency).await;

        let now = Utc::now();
        let wallet = Wallet {
            id: Uuid::new_v4(),
            owner_id,
            owner_name,
            address: generate_address(),
            balance: self.config.starting_balance,
            kind: WalletKind::New,
            created_at: now,
            connected_at: Some(now),
        };

        let mut sessions = self.sessions.lock().await;
        {
            let mut wallets = self.wallets.write().await;
            wallets.push(wallet.clone());
            if let Err(e) = self.persist_wallets(&wallets) {
                wallets.pop();
                return Err(e.into());
            }
        }
        self.save_session(&wallet)?;
        self.start_session(&mut sessions, owner_id, wallet.id);

        tracing::info!(owner = %owner_id, address = %wallet.address, "Wallet created");
        Ok(wallet)
    }

    /// Connect the owner's most recently created wallet
    pub async fn connect_existing_wallet(&self, owner_id: Uuid) -> Result<Wallet, WalletError> {
        self.disconnect_wallet(owner_id).await?;
        tokio::time::sleep(self.config.network_latency).await;

        let mut sessions = self.sessions.lock().await;
        let wallet = {
            let mut wallets = self.wallets.write().await;
            let index = wallets
                .iter()
                .enumerate()
                .filter(|(_, w)| w.owner_id == owner_id)
                .max_by_key(|(_, w)| w.created_at)
                .map(|(i, _)| i)
                .ok_or(WalletError::WalletNotFound(owner_id))?;

            let previous = wallets[index].clone();
            wallets[index].kind = WalletKind::Existing;
            wallets[index].connected_at = Some(Utc::now());
            if let Err(e) = self.persist_wallets(&wallets) {
                wallets[index] = previous;
                return Err(e.into());
            }
            wallets[index].clone()
        };
        self.save_session(&wallet)?;
        self.start_session(&mut sessions, owner_id, wallet.id);

        tracing::info!(owner = %owner_id, address = %wallet.address, "Wallet connected");
        Ok(wallet)
    }

    /// Abort pending transfers, refund them and forget the session
    pub async fn disconnect_wallet(&self, owner_id: Uuid) -> Result<(), WalletError> {
        let mut sessions = self.sessions.lock().await;
        if let Some(session) = sessions.remove(&owner_id) {
            let refunded = self.fail_pending(&sessions, session).await?;
            tracing::info!(owner = %owner_id, refunded = %refunded, "Wallet disconnected");
        }

        self.storage.remove_item(&keys::wallet_session(owner_id))?;
        Ok(())
    }

    /// Abort one pending transfer, mark it failed and refund it
    pub async fn cancel_transfer(&self, owner_id: Uuid, tx_id: Uuid) -> Result<Decimal, WalletError> {
        let mut sessions = self.sessions.lock().await;
        let (wallet_id, transfer) = match sessions.get_mut(&owner_id) {
            Some(session) => match session.pending.remove(&tx_id) {
                Some(transfer) => (session.wallet_id, transfer),
                None => return Err(WalletError::TransferNotPending(tx_id)),
            },
            None => return Err(WalletError::NotConnected),
        };

        transfer.handle.abort();
        if let Err(e) = self.ledger.fail(tx_id).await {
            tracing::warn!(tx_id = %tx_id, error = %e, "Failed to mark transfer as failed");
        }
        self.credit(&sessions, wallet_id, transfer.amount).await?;

        tracing::info!(tx_id = %tx_id, owner = %owner_id, amount = %transfer.amount, "Transfer cancelled");
        Ok(transfer.amount)
    }

    /// Fail and refund every pending transfer; persisted sessions are kept
    pub async fn shutdown(&self) {
        let mut sessions = self.sessions.lock().await;
        let owners: Vec<Uuid> = sessions.keys().copied().collect();
        for owner_id in owners {
            if let Some(session) = sessions.remove(&owner_id) {
                if let Err(e) = self.fail_pending(&sessions, session).await {
                    tracing::error!(owner = %owner_id, error = %e, "Failed to settle pending transfers");
                }
            }
        }
    }

    async fn fail_pending(
        &self,
        sessions: &HashMap<Uuid, Session>,
        session: Session,
    ) -> Result<Decimal, WalletError> {
        let mut refund = Decimal::ZERO;
        for (tx_id, transfer) in session.pending {
            transfer.handle.abort();
            refund += transfer.amount;
            if let Err(e) = self.ledger.fail(tx_id).await {
                tracing::warn!(tx_id = %tx_id, error = %e, "Failed to mark transfer as failed");
            }
        }

        if !refund.is_zero() {
            self.credit(sessions, session.wallet_id, refund).await?;
        }
        Ok(refund)
    }

    async fn credit(
        &self,
        sessions: &HashMap<Uuid, Session>,
        wallet_id: Uuid,
        amount: Decimal,
    ) -> Result<(), StorageError> {
        let mut wallets = self.wallets.write().await;
        let Some(index) = wallets.iter().position(|w| w.id == wallet_id) else {
            tracing::warn!(wallet_id = %wallet_id, "Credit to unknown wallet skipped");
            return Ok(());
        };

        wallets[index].balance += amount;
        if let Err(e) = self.persist_wallets(&wallets) {
            wallets[index].balance -= amount;
            return Err(e);
        }

        let wallet = &wallets[index];
        let connected = sessions
            .get(&wallet.owner_id)
            .map(|s| s.wallet_id == wallet.id)
            .unwrap_or(false);
        if connected {
            self.save_session(wallet)?;
        }
        Ok(())
    }

    pub async fn status(&self, owner_id: Uuid) -> WalletStatus {
        let mut sessions = self.sessions.lock().await;
        let Some(wallet_id) = self.restore_session(&mut sessions, owner_id).await else {
            return WalletStatus::disconnected();
        };

        let wallets = self.wallets.read().await;
        WalletStatus {
            connected: true,
            wallet: wallets.iter().find(|w| w.id == wallet_id).cloned(),
            pending_transfers: sessions
                .get(&owner_id)
                .map(|s| s.pending.len())
                .unwrap_or(0),
        }
    }

    /// Connected wallet of `owner_id`
    pub async fn wallet(&self, owner_id: Uuid) -> Result<Wallet, WalletError> {
        self.status(owner_id)
            .await
            .wallet
            .ok_or(WalletError::NotConnected)
    }

    pub async fn balance(&self, owner_id: Uuid) -> Result<Decimal, WalletError> {
        Ok(self.wallet(owner_id).await?.balance)
    }

    /// Ledger entries sent from or to the connected wallet, newest first
    pub async fn history(&self, owner_id: Uuid) -> Result<Vec<Transaction>, WalletError> {
        let wallet = self.wallet(owner_id).await?;
        let mut entries = self.ledger.list_by_address(&wallet.address).await;
        entries.reverse();
        Ok(entries)
    }

    /// Address of the owner's most recently created wallet
    pub async fn address_of(&self, owner_id: Uuid) -> Option<String> {
        let wallets = self.wallets.read().await;
        wallets
            .iter()
            .filter(|w| w.owner_id == owner_id)
            .max_by_key(|w| w.created_at)
            .map(|w| w.address.clone())
    }

    /// Debit the connected wallet and schedule confirmation of the transfer
    pub async fn send_transaction(
        self: &Arc<Self>,
        owner_id: Uuid,
        request: SendRequest,
    ) -> Result<Transaction, WalletError> {
        let amount = request.amount;
        if amount <= Decimal::ZERO {
            return Err(WalletError::InvalidAmount(amount));
        }
        if !is_valid_address(&request.to) {
            return Err(WalletError::InvalidAddress(request.to));
        }

        let mut sessions = self.sessions.lock().await;
        let wallet_id = self
            .restore_session(&mut sessions, owner_id)
            .await
            .ok_or(WalletError::NotConnected)?;

        let from = {
            let mut wallets = self.wallets.write().await;
            let index = wallets
                .iter()
                .position(|w| w.id == wallet_id)
                .ok_or(WalletError::NotConnected)?;

            let balance = wallets[index].balance;
            if amount > balance {
                return Err(WalletError::InsufficientBalance { balance, amount });
            }

            wallets[index].balance -= amount;
            if let Err(e) = self.persist_wallets(&wallets) {
                wallets[index].balance = balance;
                return Err(e.into());
            }
            if let Err(e) = self.save_session(&wallets[index]) {
                tracing::warn!(owner = %owner_id, error = %e, "Failed to update wallet session");
            }
            wallets[index].address.clone()
        };

        let mut entry = NewTransaction::new(TransactionType::Send, amount, TransactionStatus::Pending);
        entry.from = Some(from);
        entry.to = Some(request.to);
        entry.product_id = request.product_id;
        entry.order_id = request.order_id;
        entry.initiator_id = Some(owner_id);

        let tx = match self.ledger.append(entry).await {
            Ok(tx) => tx,
            Err(e) => {
                self.credit(&sessions, wallet_id, amount).await?;
                return Err(e.into());
            }
        };

        let Some(session) = sessions.get_mut(&owner_id) else {
            return Err(WalletError::NotConnected);
        };
        let generation = session.generation;
        let delay = self.config.confirmation_delay;
        let service = Arc::clone(self);
        let tx_id = tx.id;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            service.complete_transfer(owner_id, generation, tx_id).await;
        });
        session.pending.insert(tx.id, PendingTransfer { amount, handle });

        tracing::info!(
            tx_id = %tx.id,
            owner = %owner_id,
            amount = %amount,
            "Transfer submitted"
        );
        Ok(tx)
    }

    async fn complete_transfer(&self, owner_id: Uuid, generation: u64, tx_id: Uuid) {
        let sessions = {
            let mut sessions = self.sessions.lock().await;
            let transfer = match sessions.get_mut(&owner_id) {
                Some(session) if session.generation == generation => session.pending.remove(&tx_id),
                _ => None,
            };
            if transfer.is_none() {
                tracing::debug!(tx_id = %tx_id, "Stale confirmation ignored");
                return;
            }
            sessions
        };

        let tx = match self.ledger.confirm(tx_id).await {
            Ok(tx) => tx,
            Err(e) => {
                tracing::error!(tx_id = %tx_id, error = %e, "Failed to confirm transfer");
                return;
            }
        };

        let recipient = {
            let wallets = self.wallets.read().await;
            tx.to.as_deref().and_then(|to| {
                wallets
                    .iter()
                    .find(|w| w.address == to)
                    .map(|w| (w.id, w.owner_id))
            })
        };

        if let Some((wallet_id, recipient_id)) = recipient {
            if let Err(e) = self.credit(&sessions, wallet_id, tx.amount).await {
                tracing::error!(tx_id = %tx_id, error = %e, "Failed to credit recipient");
                return;
            }

            let mut receive =
                NewTransaction::new(TransactionType::Receive, tx.amount, TransactionStatus::Confirmed);
            receive.from = tx.from.clone();
            receive.to = tx.to.clone();
            receive.product_id = tx.product_id;
            receive.order_id = tx.order_id;
            receive.initiator_id = Some(recipient_id);
            if let Err(e) = self.ledger.append(receive).await {
                tracing::error!(tx_id = %tx_id, error = %e, "Failed to record receipt");
            }
        }

        tracing::info!(tx_id = %tx_id, owner = %owner_id, "Transfer confirmed");
    }
}
