//! Authentication HTTP handlers
//!
//! Registration, password login and session management.

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use super::AuthenticatedUser;
use crate::error::ApiError;
use crate::models::{
    AuthTokensResponse, CurrentUserResponse, LoginRequest, RefreshTokenRequest, RegisterRequest,
    UserResponse,
};
use crate::state::AppState;

/// POST /auth/register - Create an account
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let user = state.auth_service.register(req).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

/// POST /auth/login - Check credentials and issue tokens
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthTokensResponse>, ApiError> {
    let tokens = state.auth_service.login(req).await?;
    Ok(Json(tokens))
}

/// POST /auth/refresh - Refresh access token using refresh token
pub async fn refresh_token(
    State(state): State<AppState>,
    Json(req): Json<RefreshTokenRequest>,
) -> Result<Json<AuthTokensResponse>, ApiError> {
    let tokens = state
        .auth_service
        .refresh_tokens(&req.refresh_token)
        .await?;
    Ok(Json(tokens))
}

/// POST /auth/logout - Revoke current session
pub async fn logout(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<StatusCode, ApiError> {
    state.auth_service.revoke_session(&user.jti).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /auth/logout-all - Revoke all sessions for current user
pub async fn logout_all(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Json<LogoutAllResponse> {
    let revoked_sessions = state.auth_service.revoke_all_sessions(user.user_id).await;
    Json(LogoutAllResponse { revoked_sessions })
}

/// GET /auth/me - Current user with the role's dashboard and navigation
pub async fn get_current_user(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<CurrentUserResponse>, ApiError> {
    let user = state.auth_service.get_user_by_id(user.user_id).await?;
    Ok(Json(UserResponse::from(user).into()))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogoutAllResponse {
    pub revoked_sessions: u64,
}
