//! Wallet domain module
//!
//! Simulated wallets: creation, lookup, transfers with delayed confirmation.

mod model;
mod service;

pub use model::*;
pub use service::{WalletError, WalletService};
