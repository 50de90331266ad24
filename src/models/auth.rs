//! Authentication models for the supply-chain server

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::{NavItem, UserResponse, UserRole};

/// Server-side session tracked per access token
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub id: Uuid,
    pub user_id: Uuid,
    pub jti: String,
    pub refresh_token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub revoked: bool,
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// Request/Response DTOs
// ============================================================================

/// Registration form
#[derive(Debug, Deserialize, Validate, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub role: UserRole,
    #[validate(length(min = 2, max = 100, message = "Name must be 2-100 characters"))]
    pub name: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(custom = "validate_cnic")]
    pub cnic: String,
    #[validate(length(min = 5, message = "Address is required"))]
    pub address: String,
    #[validate(custom = "validate_phone")]
    pub phone: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
}

/// Credentials for login
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Refresh token request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

/// Auth tokens response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthTokensResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub user: UserResponse,
    /// Landing route for the user's role
    pub dashboard: &'static str,
    pub navigation: &'static [NavItem],
}

/// Current user with role-specific navigation
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUserResponse {
    pub user: UserResponse,
    pub dashboard: &'static str,
    pub navigation: &'static [NavItem],
}

impl From<UserResponse> for CurrentUserResponse {
    fn from(user: UserResponse) -> Self {
        Self {
            dashboard: user.role.dashboard_path(),
            navigation: user.role.navigation(),
            user,
        }
    }
}

/// CNIC format: #####-#######-#
fn validate_cnic(cnic: &str) -> Result<(), ValidationError> {
    let groups: Vec<&str> = cnic.split('-').collect();
    let valid = groups.len() == 3
        && groups
            .iter()
            .zip([5usize, 7, 1])
            .all(|(group, len)| group.len() == len && group.chars().all(|c| c.is_ascii_digit()));

    if valid {
        Ok(())
    } else {
        let mut err = ValidationError::new("cnic");
        err.message = Some("CNIC must match #####-#######-#".into());
        Err(err)
    }
}

/// 10 to 15 digits with an optional leading '+'
fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    let digits = phone.strip_prefix('+').unwrap_or(phone);
    let valid = (10..=15).contains(&digits.len()) && digits.chars().all(|c| c.is_ascii_digit());

    if valid {
        Ok(())
    } else {
        let mut err = ValidationError::new("phone");
        err.message = Some("Phone must be 10-15 digits".into());
        Err(err)
    }
}
