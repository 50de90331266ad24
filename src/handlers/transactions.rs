//! Ledger handlers

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use super::AuthenticatedUser;
use crate::error::ApiError;
use crate::ledger::{ChainVerification, LedgerError, Transaction};
use crate::models::UserRole;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct TransactionListQuery {
    /// Only the newest `limit` entries
    pub limit: Option<usize>,
}

/// GET /transactions - Experts see the whole log, others their own entries
pub async fn list_transactions(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<TransactionListQuery>,
) -> Json<Vec<Transaction>> {
    let mut entries = match user.role {
        UserRole::Expert => state.ledger.list().await,
        _ => state.ledger.list_by_user(user.user_id).await,
    };

    entries.reverse();
    if let Some(limit) = query.limit {
        entries.truncate(limit);
    }
    Json(entries)
}

/// GET /transactions/:id
pub async fn get_transaction(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Transaction>, ApiError> {
    let tx = state
        .ledger
        .get(id)
        .await
        .filter(|tx| user.role == UserRole::Expert || tx.involves(user.user_id))
        .ok_or(LedgerError::NotFound(id))?;
    Ok(Json(tx))
}

/// GET /transactions/verify - Re-hash the chain
pub async fn verify_chain(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<ChainVerification>, ApiError> {
    user.require_role(&[UserRole::Expert])?;
    Ok(Json(state.ledger.verify_chain().await))
}
