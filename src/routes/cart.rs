//! Shopping cart and checkout routes

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::handlers::cart;
use crate::state::AppState;

pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/cart", get(cart::get_cart).delete(cart::clear_cart))
        .route("/cart/items", post(cart::add_item))
        .route(
            "/cart/items/:product_id",
            put(cart::set_quantity).delete(cart::remove_item),
        )
        .route("/cart/checkout", post(cart::checkout))
}
