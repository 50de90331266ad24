//! Wallet session routes

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::wallet;
use crate::state::AppState;

/// Create wallet routes
pub fn wallet_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/wallet",
            get(wallet::wallet_status)
                .post(wallet::create_wallet)
                .delete(wallet::disconnect_wallet),
        )
        .route("/wallet/connect", post(wallet::connect_wallet))
        .route("/wallet/balance", get(wallet::get_balance))
        .route("/wallet/send", post(wallet::send_transaction))
        .route("/wallet/history", get(wallet::wallet_history))
}
