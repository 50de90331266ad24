//! Wallet handlers for the caller's simulated wallet session

use axum::{extract::State, http::StatusCode, Json};
use rust_decimal::Decimal;
use serde::Serialize;

use super::AuthenticatedUser;
use crate::error::ApiError;
use crate::ledger::Transaction;
use crate::state::AppState;
use crate::wallet::{CreateWalletRequest, SendRequest, Wallet, WalletStatus};

#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    pub balance: Decimal,
}

/// GET /wallet - Connection status of the caller's session
pub async fn wallet_status(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Json<WalletStatus> {
    Json(state.wallet_service.status(user.user_id).await)
}

/// POST /wallet - Create and connect a fresh wallet
pub async fn create_wallet(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    body: Option<Json<CreateWalletRequest>>,
) -> Result<(StatusCode, Json<Wallet>), ApiError> {
    let req = body.map(|Json(req)| req).unwrap_or_default();
    let owner_name = match req.owner_name {
        Some(name) => Some(name),
        None => Some(state.auth_service.get_user_by_id(user.user_id).await?.name),
    };

    let wallet = state
        .wallet_service
        .create_new_wallet(user.user_id, owner_name)
        .await?;
    state
        .auth_service
        .set_wallet_address(user.user_id, Some(wallet.address.clone()))
        .await?;

    Ok((StatusCode::CREATED, Json(wallet)))
}

/// POST /wallet/connect - Reconnect the caller's registered wallet
pub async fn connect_wallet(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<Wallet>, ApiError> {
    let wallet = state
        .wallet_service
        .connect_existing_wallet(user.user_id)
        .await?;
    state
        .auth_service
        .set_wallet_address(user.user_id, Some(wallet.address.clone()))
        .await?;

    Ok(Json(wallet))
}

/// DELETE /wallet - Cancel pending transfers and end the session
pub async fn disconnect_wallet(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<StatusCode, ApiError> {
    state.wallet_service.disconnect_wallet(user.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /wallet/balance
pub async fn get_balance(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<BalanceResponse>, ApiError> {
    let balance = state.wallet_service.balance(user.user_id).await?;
    Ok(Json(BalanceResponse { balance }))
}

/// POST /wallet/send - Debit now, confirm after the network delay
pub async fn send_transaction(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(req): Json<SendRequest>,
) -> Result<(StatusCode, Json<Transaction>), ApiError> {
    let tx = state
        .wallet_service
        .send_transaction(user.user_id, req)
        .await?;
    Ok((StatusCode::ACCEPTED, Json(tx)))
}

/// GET /wallet/history - Entries from or to the connected wallet
pub async fn wallet_history(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<Vec<Transaction>>, ApiError> {
    Ok(Json(state.wallet_service.history(user.user_id).await?))
}
