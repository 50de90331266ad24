//! Supply-chain marketplace server library
//!
//! Persistent stores for products, orders, wallets and the transaction
//! ledger, role dashboards, and the HTTP API that exposes them.

pub mod auth;
pub mod cart;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod handlers;
pub mod ledger;
pub mod middleware;
pub mod models;
pub mod order;
pub mod product;
pub mod routes;
pub mod services;
pub mod state;
pub mod storage;
pub mod wallet;
pub mod websocket;
