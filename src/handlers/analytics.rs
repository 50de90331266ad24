//! Analytics handlers

use axum::{extract::State, Json};

use super::AuthenticatedUser;
use crate::error::ApiError;
use crate::models::UserRole;
use crate::services::{CustomerSummary, InventoryReport, VendorAnalytics};
use crate::state::AppState;

/// GET /analytics/vendor
///
/// Sales figures over the caller's own order lines.
pub async fn vendor_analytics(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<VendorAnalytics>, ApiError> {
    user.require_role(&[UserRole::Supplier, UserRole::Vendor])?;
    Ok(Json(state.analytics.vendor_analytics(user.user_id).await))
}

/// GET /analytics/inventory
pub async fn inventory_report(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<InventoryReport>, ApiError> {
    user.require_role(&[UserRole::Supplier, UserRole::Vendor])?;
    Ok(Json(state.analytics.inventory_report(user.user_id).await))
}

/// GET /analytics/customer
pub async fn customer_summary(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<CustomerSummary>, ApiError> {
    user.require_role(&[UserRole::Customer])?;
    Ok(Json(state.analytics.customer_summary(user.user_id).await))
}
