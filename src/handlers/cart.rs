//! Cart and checkout handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use super::AuthenticatedUser;
use crate::cart::{AddToCartRequest, CartSummary, CheckoutReceipt, SetQuantityRequest};
use crate::error::ApiError;
use crate::models::UserRole;
use crate::state::AppState;

const CUSTOMERS: &[UserRole] = &[UserRole::Customer];

/// GET /cart - Items with totals
pub async fn get_cart(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<CartSummary>, ApiError> {
    user.require_role(CUSTOMERS)?;
    Ok(Json(state.cart_store.summary(user.user_id).await))
}

/// POST /cart/items - Add one unit of a product
pub async fn add_item(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(req): Json<AddToCartRequest>,
) -> Result<Json<CartSummary>, ApiError> {
    user.require_role(CUSTOMERS)?;
    state
        .cart_store
        .add_item(user.user_id, req.product_id)
        .await?;
    Ok(Json(state.cart_store.summary(user.user_id).await))
}

/// PUT /cart/items/:product_id - Set a line's quantity, zero removes it
pub async fn set_quantity(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(product_id): Path<Uuid>,
    Json(req): Json<SetQuantityRequest>,
) -> Result<Json<CartSummary>, ApiError> {
    user.require_role(CUSTOMERS)?;
    state
        .cart_store
        .set_quantity(user.user_id, product_id, req.quantity)
        .await?;
    Ok(Json(state.cart_store.summary(user.user_id).await))
}

/// DELETE /cart/items/:product_id
pub async fn remove_item(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(product_id): Path<Uuid>,
) -> Result<Json<CartSummary>, ApiError> {
    user.require_role(CUSTOMERS)?;
    state
        .cart_store
        .remove_item(user.user_id, product_id)
        .await?;
    Ok(Json(state.cart_store.summary(user.user_id).await))
}

/// DELETE /cart
pub async fn clear_cart(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<StatusCode, ApiError> {
    user.require_role(CUSTOMERS)?;
    state.cart_store.clear(user.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /cart/checkout - Turn the cart into a paid order
pub async fn checkout(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<(StatusCode, Json<CheckoutReceipt>), ApiError> {
    user.require_role(CUSTOMERS)?;
    let customer = state.auth_service.get_user_by_id(user.user_id).await?;

    let receipt = state
        .checkout_service
        .checkout(customer.id, Some(customer.name))
        .await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}
