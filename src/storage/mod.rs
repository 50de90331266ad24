//! Key-value persistence for the marketplace stores
//!
//! Every store mirrors its whole collection to a single key as JSON text,
//! mirroring the browser-local layout the dashboards were built around.
//! Backends implement [`Storage`]; stores receive one through injection so
//! tests can run against [`MemoryStorage`].

mod file;
mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Storage keys shared by the stores
pub mod keys {
    use uuid::Uuid;

    pub const PRODUCTS: &str = "supply_chain_products";
    pub const ORDERS: &str = "supply_chain_orders";
    pub const TRANSACTIONS: &str = "supply_chain_transactions";
    pub const USERS: &str = "supply_chain_users";
    pub const WALLETS: &str = "supply_chain_wallets";
    pub const EXPERT_DASHBOARD: &str = "blockchain_expert_dashboard";

    /// Wallet of the owner's active session
    pub fn wallet_session(owner_id: Uuid) -> String {
        format!("blockchain_wallet_{}", owner_id)
    }

    pub fn cart(user_id: Uuid) -> String {
        format!("cart_{}", user_id)
    }

    pub fn supplier_dashboard(user_id: Uuid) -> String {
        format!("supplier_dashboard_{}", user_id)
    }
}

/// Storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Local key-value storage holding JSON text values
pub trait Storage: Send + Sync {
    /// Read the raw value stored under `key`
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Replace the value stored under `key`
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove `key`; removing a missing key is not an error
    fn remove_item(&self, key: &str) -> Result<(), StorageError>;
}

/// Load a JSON value, falling back to `T::default()` when the key is missing
/// or the stored text does not parse.
pub fn load_or_default<T>(storage: &dyn Storage, key: &str) -> T
where
    T: DeserializeOwned + Default,
{
    load_json(storage, key).unwrap_or_default()
}

/// Load a JSON value. Missing keys and corrupt values both yield `None`;
/// corruption is logged and otherwise ignored.
pub fn load_json<T>(storage: &dyn Storage, key: &str) -> Option<T>
where
    T: DeserializeOwned,
{
    let raw = match storage.get_item(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            tracing::warn!(key = %key, error = %e, "Failed to read stored value");
            return None;
        }
    };

    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(key = %key, error = %e, "Stored value is corrupt, using defaults");
            None
        }
    }
}

/// Serialize `value` and write it under `key`
pub fn save_json<T>(storage: &dyn Storage, key: &str, value: &T) -> Result<(), StorageError>
where
    T: Serialize + ?Sized,
{
    let raw = serde_json::to_string(value)?;
    storage.set_item(key, &raw)
}

/// Keys are restricted to characters that are safe as file names
pub(crate) fn validate_key(key: &str) -> Result<(), StorageError> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');

    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(key.to_string()))
    }
}

/// Deterministic id used for the sample catalog owners
pub(crate) const fn sample_id(n: u128) -> Uuid {
    Uuid::from_u128(0x5a4d_0000_0000_4000_8000_0000_0000_0000 | n)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_validation() {
        assert!(validate_key("supply_chain_products").is_ok());
        assert!(validate_key(&keys::cart(Uuid::new_v4())).is_ok());
        assert!(validate_key("").is_err());
        assert!(validate_key("../etc/passwd").is_err());
        assert!(validate_key("a b").is_err());
    }

    #[test]
    fn test_load_json_missing_key() {
        let storage = MemoryStorage::new();
        let value: Option<Vec<String>> = load_json(&storage, "missing");
        assert!(value.is_none());
    }

    #[test]
    fn test_corrupt_value_falls_back_to_default() {
        let storage = MemoryStorage::new();
        storage.set_item("broken", "{not json").unwrap();

        let value: Vec<String> = load_or_default(&storage, "broken");
        assert!(value.is_empty());
    }

    #[test]
    fn test_save_then_load() {
        let storage = MemoryStorage::new();
        let items = vec!["a".to_string(), "b".to_string()];
        save_json(&storage, "items", &items).unwrap();

        let loaded: Vec<String> = load_or_default(&storage, "items");
        assert_eq!(loaded, items);
    }
}
