//! API handlers for the supply-chain server

pub mod analytics;
pub mod auth;
pub mod cart;
pub mod dashboard;
pub mod health;
pub mod orders;
pub mod products;
pub mod transactions;
pub mod wallet;

// Re-export AuthenticatedUser from middleware for handler use
pub use crate::middleware::auth::AuthenticatedUser;
