//! Supplier and expert dashboard handlers

use axum::{extract::State, Json};

use super::AuthenticatedUser;
use crate::dashboard::{
    AddInventoryRequest, AddVendorRequest, ConsensusPatch, ExpertDashboard, ExpertOverview,
    FaultTolerancePatch, SecurityPatch, ShipmentRequest, SupplierDashboardView,
};
use crate::error::ApiError;
use crate::models::UserRole;
use crate::state::AppState;

/// GET /dashboard/supplier
pub async fn supplier_dashboard(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<SupplierDashboardView>, ApiError> {
    user.require_role(&[UserRole::Supplier])?;
    Ok(Json(state.supplier_dashboards.get(user.user_id).await))
}

/// POST /dashboard/supplier/inventory
pub async fn add_inventory(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(req): Json<AddInventoryRequest>,
) -> Result<Json<SupplierDashboardView>, ApiError> {
    user.require_role(&[UserRole::Supplier])?;
    let view = state
        .supplier_dashboards
        .add_inventory(user.user_id, req)
        .await?;
    Ok(Json(view))
}

/// POST /dashboard/supplier/shipments
pub async fn record_shipment(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(req): Json<ShipmentRequest>,
) -> Result<Json<SupplierDashboardView>, ApiError> {
    user.require_role(&[UserRole::Supplier])?;
    let view = state
        .supplier_dashboards
        .record_shipment(user.user_id, req)
        .await?;
    Ok(Json(view))
}

/// POST /dashboard/supplier/vendors
pub async fn add_vendor(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(req): Json<AddVendorRequest>,
) -> Result<Json<SupplierDashboardView>, ApiError> {
    user.require_role(&[UserRole::Supplier])?;
    let view = state.supplier_dashboards.add_vendor(user.user_id, req).await?;
    Ok(Json(view))
}

/// DELETE /dashboard/supplier
pub async fn reset_supplier_dashboard(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<SupplierDashboardView>, ApiError> {
    user.require_role(&[UserRole::Supplier])?;
    Ok(Json(state.supplier_dashboards.reset(user.user_id).await?))
}

/// GET /dashboard/expert
pub async fn expert_overview(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<ExpertOverview>, ApiError> {
    user.require_role(&[UserRole::Expert])?;
    Ok(Json(state.expert_dashboard.overview().await))
}

/// PUT /dashboard/expert/consensus
pub async fn update_consensus(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(patch): Json<ConsensusPatch>,
) -> Result<Json<ExpertDashboard>, ApiError> {
    user.require_role(&[UserRole::Expert])?;
    Ok(Json(state.expert_dashboard.update_consensus(patch).await?))
}

/// PUT /dashboard/expert/security
pub async fn update_security(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(patch): Json<SecurityPatch>,
) -> Result<Json<ExpertDashboard>, ApiError> {
    user.require_role(&[UserRole::Expert])?;
    Ok(Json(state.expert_dashboard.update_security(patch).await?))
}

/// PUT /dashboard/expert/fault-tolerance
pub async fn update_fault_tolerance(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(patch): Json<FaultTolerancePatch>,
) -> Result<Json<ExpertDashboard>, ApiError> {
    user.require_role(&[UserRole::Expert])?;
    Ok(Json(
        state.expert_dashboard.update_fault_tolerance(patch).await?,
    ))
}

/// POST /dashboard/expert/health-report
pub async fn generate_health_report(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<ExpertDashboard>, ApiError> {
    user.require_role(&[UserRole::Expert])?;
    Ok(Json(state.expert_dashboard.generate_health_report().await?))
}

/// DELETE /dashboard/expert
pub async fn reset_expert_dashboard(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<ExpertDashboard>, ApiError> {
    user.require_role(&[UserRole::Expert])?;
    Ok(Json(state.expert_dashboard.reset().await?))
}
