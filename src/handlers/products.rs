//! Product catalog handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use super::AuthenticatedUser;
use crate::error::ApiError;
use crate::models::UserRole;
use crate::product::{NewProduct, Product, ProductError, ProductPatch, ProductQuery};
use crate::state::AppState;

const SELLERS: &[UserRole] = &[UserRole::Supplier, UserRole::Vendor];

/// GET /products - Browse the catalog
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> Json<Vec<Product>> {
    Json(state.product_store.search(&query).await)
}

/// GET /products/categories
pub async fn list_categories(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.product_store.categories().await)
}

/// GET /products/mine - Products owned by the caller
pub async fn my_products(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<Vec<Product>>, ApiError> {
    user.require_role(SELLERS)?;
    Ok(Json(state.product_store.list_by_owner(user.user_id).await))
}

/// GET /products/:id
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Product>, ApiError> {
    let product = state
        .product_store
        .get(id)
        .await
        .ok_or(ProductError::NotFound(id))?;
    Ok(Json(product))
}

/// POST /products - Add a product owned by the caller
pub async fn create_product(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(req): Json<NewProduct>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    user.require_role(SELLERS)?;
    let owner = state.auth_service.get_user_by_id(user.user_id).await?;

    let product = state
        .product_store
        .add(owner.id, &owner.name, req)
        .await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// PUT /products/:id - Patch a product the caller owns
pub async fn update_product(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(patch): Json<ProductPatch>,
) -> Result<Json<Product>, ApiError> {
    ensure_owner(&state, &user, id).await?;
    let product = state.product_store.update(id, patch).await?;
    Ok(Json(product))
}

/// DELETE /products/:id
pub async fn delete_product(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    ensure_owner(&state, &user, id).await?;
    state.product_store.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn ensure_owner(
    state: &AppState,
    user: &AuthenticatedUser,
    id: Uuid,
) -> Result<(), ApiError> {
    user.require_role(SELLERS)?;
    let product = state
        .product_store
        .get(id)
        .await
        .ok_or(ProductError::NotFound(id))?;

    if product.supplier_id != user.user_id {
        return Err(ApiError::Forbidden(
            "Only the owner can modify this product".to_string(),
        ));
    }
    Ok(())
}
