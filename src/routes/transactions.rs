//! Ledger routes

use axum::{routing::get, Router};

use crate::handlers::transactions;
use crate::state::AppState;

pub fn transaction_routes() -> Router<AppState> {
    Router::new()
        .route("/transactions", get(transactions::list_transactions))
        .route("/transactions/verify", get(transactions::verify_chain))
        .route("/transactions/:id", get(transactions::get_transaction))
}
