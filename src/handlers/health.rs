//! Liveness endpoints

use axum::{extract::State, Json};
use serde::Serialize;

use crate::state::AppState;

pub async fn root() -> &'static str {
    "Supply-chain marketplace API"
}

/// Health check response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub ledger_blocks: usize,
    pub chain_valid: bool,
    pub websocket_clients: usize,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let chain = state.ledger.verify_chain().await;
    Json(HealthResponse {
        status: if chain.valid { "healthy" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        ledger_blocks: state.ledger.len().await,
        chain_valid: chain.valid,
        websocket_clients: state.ws_state.client_count().await,
    })
}
