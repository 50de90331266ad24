//! Centralized API error handling for the supply-chain server
//!
//! This module provides a unified error type for API responses with proper
//! HTTP status code mapping and JSON error responses. Every store error
//! converts into it so handlers can use `?` throughout.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::auth::AuthError;
use crate::cart::{CartError, CheckoutError};
use crate::dashboard::DashboardError;
use crate::ledger::LedgerError;
use crate::order::OrderError;
use crate::product::ProductError;
use crate::storage::StorageError;
use crate::wallet::WalletError;

/// API error type with HTTP status code mapping
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unprocessable entity: {0}")]
    UnprocessableEntity(String),

    #[error("Too many requests")]
    TooManyRequests,

    #[error("Internal server error: {0}")]
    InternalError(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

/// JSON error response body
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetails,
}

/// Error details in the response
#[derive(Serialize)]
pub struct ErrorDetails {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    /// Get the error code string
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::UnprocessableEntity(_) => "UNPROCESSABLE_ENTITY",
            ApiError::TooManyRequests => "TOO_MANY_REQUESTS",
            ApiError::InternalError(_) => "INTERNAL_ERROR",
            ApiError::StorageError(_) => "STORAGE_ERROR",
            ApiError::ValidationError(_) => "VALIDATION_ERROR",
        }
    }

    /// Get the HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::UnprocessableEntity(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::StorageError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::ValidationError(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code();
        let message = self.to_string();

        // Log server errors
        match &self {
            ApiError::InternalError(_) | ApiError::StorageError(_) => {
                tracing::error!(error = %message, code = %error_code, "Server error occurred");
            }
            _ => {
                tracing::debug!(error = %message, code = %error_code, "Client error occurred");
            }
        }

        let body = ErrorResponse {
            error: ErrorDetails {
                code: error_code.to_string(),
                message,
                details: None,
            },
        };

        (status, Json(body)).into_response()
    }
}

// Conversions from the store errors

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        ApiError::StorageError(err.to_string())
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::NotFound(_) => ApiError::NotFound(err.to_string()),
            LedgerError::AlreadySettled { .. } => ApiError::Conflict(err.to_string()),
            LedgerError::Storage(e) => e.into(),
        }
    }
}

impl From<ProductError> for ApiError {
    fn from(err: ProductError) -> Self {
        match err {
            ProductError::Validation(msg) => ApiError::ValidationError(msg),
            ProductError::NotFound(_) => ApiError::NotFound(err.to_string()),
            ProductError::InsufficientStock { .. } => ApiError::Conflict(err.to_string()),
            ProductError::Storage(e) => e.into(),
        }
    }
}

impl From<OrderError> for ApiError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::EmptyOrder | OrderError::TotalMismatch { .. } => {
                ApiError::BadRequest(err.to_string())
            }
            OrderError::NotFound(_) => ApiError::NotFound(err.to_string()),
            OrderError::InvalidTransition { .. } => ApiError::Conflict(err.to_string()),
            OrderError::Ledger(e) => e.into(),
            OrderError::Storage(e) => e.into(),
        }
    }
}

impl From<WalletError> for ApiError {
    fn from(err: WalletError) -> Self {
        match err {
            WalletError::NotConnected => ApiError::Conflict(err.to_string()),
            WalletError::WalletNotFound(_) => ApiError::NotFound(err.to_string()),
            WalletError::TransferNotPending(_) => ApiError::Conflict(err.to_string()),
            WalletError::InvalidAmount(_) | WalletError::InvalidAddress(_) => {
                ApiError::BadRequest(err.to_string())
            }
            WalletError::InsufficientBalance { .. } => {
                ApiError::UnprocessableEntity(err.to_string())
            }
            WalletError::Ledger(e) => e.into(),
            WalletError::Storage(e) => e.into(),
        }
    }
}

impl From<CartError> for ApiError {
    fn from(err: CartError) -> Self {
        match err {
            CartError::ProductNotFound(_) | CartError::ItemNotInCart(_) => {
                ApiError::NotFound(err.to_string())
            }
            CartError::OutOfStock(_) | CartError::StockLimitExceeded { .. } => {
                ApiError::UnprocessableEntity(err.to_string())
            }
            CartError::Storage(e) => e.into(),
        }
    }
}

impl From<CheckoutError> for ApiError {
    fn from(err: CheckoutError) -> Self {
        match err {
            CheckoutError::EmptyCart => ApiError::BadRequest(err.to_string()),
            CheckoutError::InsufficientBalance { .. } => {
                ApiError::UnprocessableEntity(err.to_string())
            }
            CheckoutError::Cart(e) => e.into(),
            CheckoutError::Product(e) => e.into(),
            CheckoutError::Order(e) => e.into(),
            CheckoutError::Wallet(e) => e.into(),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Validation(msg) => ApiError::ValidationError(msg),
            AuthError::EmailTaken => ApiError::Conflict(err.to_string()),
            AuthError::InvalidCredentials
            | AuthError::SessionNotFound
            | AuthError::InvalidRefreshToken
            | AuthError::TokenError(_) => ApiError::Unauthorized(err.to_string()),
            AuthError::UserNotFound => ApiError::NotFound(err.to_string()),
            AuthError::PasswordHash(msg) => ApiError::InternalError(msg),
            AuthError::Storage(e) => e.into(),
        }
    }
}

impl From<DashboardError> for ApiError {
    fn from(err: DashboardError) -> Self {
        match err {
            DashboardError::Validation(msg) => ApiError::ValidationError(msg),
            DashboardError::InventoryItemNotFound(_) => ApiError::NotFound(err.to_string()),
            DashboardError::InsufficientInventory { .. } => {
                ApiError::UnprocessableEntity(err.to_string())
            }
            DashboardError::Storage(e) => e.into(),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        ApiError::ValidationError(err.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::BadRequest(format!("Invalid JSON: {}", err))
    }
}

/// Result type alias using ApiError
pub type ApiResult<T> = Result<T, ApiError>;
