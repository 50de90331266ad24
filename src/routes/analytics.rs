//! Analytics route definitions

use axum::{routing::get, Router};

use crate::handlers::analytics;
use crate::state::AppState;

pub fn analytics_routes() -> Router<AppState> {
    Router::new()
        .route("/analytics/vendor", get(analytics::vendor_analytics))
        .route("/analytics/inventory", get(analytics::inventory_report))
        .route("/analytics/customer", get(analytics::customer_summary))
}
