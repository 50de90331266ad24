//! Supplier and expert dashboard routes

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::handlers::dashboard;
use crate::state::AppState;

pub fn dashboard_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/dashboard/supplier",
            get(dashboard::supplier_dashboard).delete(dashboard::reset_supplier_dashboard),
        )
        .route("/dashboard/supplier/inventory", post(dashboard::add_inventory))
        .route("/dashboard/supplier/shipments", post(dashboard::record_shipment))
        .route("/dashboard/supplier/vendors", post(dashboard::add_vendor))
        .route(
            "/dashboard/expert",
            get(dashboard::expert_overview).delete(dashboard::reset_expert_dashboard),
        )
        .route("/dashboard/expert/consensus", put(dashboard::update_consensus))
        .route("/dashboard/expert/security", put(dashboard::update_security))
        .route(
            "/dashboard/expert/fault-tolerance",
            put(dashboard::update_fault_tolerance),
        )
        .route(
            "/dashboard/expert/health-report",
            post(dashboard::generate_health_report),
        )
}
