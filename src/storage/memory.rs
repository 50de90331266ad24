//! In-memory storage backend

use std::collections::HashMap;
use std::sync::RwLock;

use super::{validate_key, Storage, StorageError};

/// Volatile storage, used by tests and `STORAGE_BACKEND=memory`
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.items.read().map(|items| items.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Storage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        validate_key(key)?;
        let items = self
            .items
            .read()
            .map_err(|_| std::io::Error::other("memory storage lock poisoned"))?;
        Ok(items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        validate_key(key)?;
        let mut items = self
            .items
            .write()
            .map_err(|_| std::io::Error::other("memory storage lock poisoned"))?;
        items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        validate_key(key)?;
        let mut items = self
            .items
            .write()
            .map_err(|_| std::io::Error::other("memory storage lock poisoned"))?;
        items.remove(key);
        Ok(())
    }
}
