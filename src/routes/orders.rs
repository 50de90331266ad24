//! Order routes

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::handlers::orders;
use crate::state::AppState;

pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/orders", get(orders::list_orders))
        .route("/orders/:id", get(orders::get_order))
        .route("/orders/:id/status", put(orders::update_order_status))
        .route("/orders/:id/advance", post(orders::advance_order))
}
