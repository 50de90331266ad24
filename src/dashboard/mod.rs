//! Role dashboards persisted as view models
//!
//! The supplier dashboard tracks bulk inventory and supply records per user;
//! the expert dashboard holds network settings and alerts shared by all experts.

mod expert;
mod supplier;

pub use expert::*;
pub use supplier::*;

use thiserror::Error;

use crate::storage::StorageError;

/// Dashboard errors
#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Inventory item not found: {0}")]
    InventoryItemNotFound(String),

    #[error("Only {available} units of {name} in inventory, {requested} requested")]
    InsufficientInventory {
        name: String,
        available: u32,
        requested: u32,
    },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<validator::ValidationErrors> for DashboardError {
    fn from(e: validator::ValidationErrors) -> Self {
        DashboardError::Validation(e.to_string())
    }
}
