//! Product catalog routes

use axum::{routing::get, Router};

use crate::handlers::products;
use crate::state::AppState;

pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/products",
            get(products::list_products).post(products::create_product),
        )
        .route("/products/categories", get(products::list_categories))
        .route("/products/mine", get(products::my_products))
        .route(
            "/products/:id",
            get(products::get_product)
                .put(products::update_product)
                .delete(products::delete_product),
        )
}
