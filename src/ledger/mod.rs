//! Ledger domain module
//!
//! Simulated blockchain log: one entry per order and per wallet transfer.

mod model;
mod service;

pub use model::*;
pub use service::{LedgerError, TransactionStore};
