//! Cart domain module
//!
//! Per-customer carts, order pricing and checkout.

mod checkout;
mod model;
mod service;

pub use checkout::{CheckoutError, CheckoutReceipt, CheckoutService, MARKETPLACE_ADDRESS};
pub use model::*;
pub use service::{CartError, CartStore};
