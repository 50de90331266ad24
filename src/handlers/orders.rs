//! Order handlers
//!
//! Customers see their own orders, sellers see orders containing their
//! items and experts see everything.

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use super::AuthenticatedUser;
use crate::error::ApiError;
use crate::models::UserRole;
use crate::order::{Order, OrderError, UpdateStatusRequest};
use crate::state::AppState;

/// GET /orders
pub async fn list_orders(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Json<Vec<Order>> {
    let orders = match user.role {
        UserRole::Customer => state.order_store.list_by_customer(user.user_id).await,
        UserRole::Supplier | UserRole::Vendor => {
            state.order_store.list_by_vendor(user.user_id).await
        }
        UserRole::Expert => state.order_store.list().await,
    };
    Json(orders)
}

/// GET /orders/:id
pub async fn get_order(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Order>, ApiError> {
    let order = visible_order(&state, &user, id).await?;
    Ok(Json(order))
}

/// PUT /orders/:id/status - Move an order to its next status
pub async fn update_order_status(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<Order>, ApiError> {
    ensure_fulfiller(&state, &user, id).await?;
    let order = state.order_store.update_status(id, req.status).await?;
    Ok(Json(order))
}

/// POST /orders/:id/advance
pub async fn advance_order(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Order>, ApiError> {
    ensure_fulfiller(&state, &user, id).await?;
    let order = state.order_store.advance(id).await?;
    Ok(Json(order))
}

async fn visible_order(
    state: &AppState,
    user: &AuthenticatedUser,
    id: Uuid,
) -> Result<Order, ApiError> {
    let order = state
        .order_store
        .get(id)
        .await
        .ok_or(OrderError::NotFound(id))?;

    let visible = match user.role {
        UserRole::Customer => order.customer_id == user.user_id,
        UserRole::Supplier | UserRole::Vendor => order.has_vendor(user.user_id),
        UserRole::Expert => true,
    };
    if !visible {
        // Indistinguishable from a missing order
        return Err(OrderError::NotFound(id).into());
    }
    Ok(order)
}

/// Status changes belong to the order's sellers and to experts
async fn ensure_fulfiller(
    state: &AppState,
    user: &AuthenticatedUser,
    id: Uuid,
) -> Result<(), ApiError> {
    user.require_role(&[UserRole::Supplier, UserRole::Vendor, UserRole::Expert])?;
    visible_order(state, user, id).await.map(|_| ())
}
