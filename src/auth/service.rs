//! Authentication service
//!
//! Registration, password login and server-side JWT sessions.

use chrono::{Duration, Utc};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;
use validator::Validate;

use crate::models::{
    AuthSession, AuthTokensResponse, LoginRequest, RegisterRequest, User,
};
use crate::storage::{keys, load_or_default, save_json, Storage, StorageError};

use super::jwt::{
    generate_access_token, generate_refresh_token, verify_token, JwtError, TokenType,
};

/// Refresh tokens outlive access tokens by a fixed window
const REFRESH_TOKEN_TTL_DAYS: i64 = 7;

/// Auth service errors
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Email already registered")]
    EmailTaken,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("User not found")]
    UserNotFound,

    #[error("Session not found or revoked")]
    SessionNotFound,

    #[error("Invalid refresh token")]
    InvalidRefreshToken,

    #[error("Token error: {0}")]
    TokenError(String),

    #[error("Password hashing failed: {0}")]
    PasswordHash(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<JwtError> for AuthError {
    fn from(e: JwtError) -> Self {
        AuthError::TokenError(e.to_string())
    }
}

impl From<validator::ValidationErrors> for AuthError {
    fn from(e: validator::ValidationErrors) -> Self {
        AuthError::Validation(e.to_string())
    }
}

impl From<bcrypt::BcryptError> for AuthError {
    fn from(e: bcrypt::BcryptError) -> Self {
        AuthError::PasswordHash(e.to_string())
    }
}

/// Authentication service
pub struct AuthService {
    storage: Arc<dyn Storage>,
    users: RwLock<Vec<User>>,
    sessions: RwLock<HashMap<String, AuthSession>>,
    jwt_secret: String,
    access_token_ttl_seconds: i64,
    bcrypt_cost: u32,
}

impl AuthService {
    /// Create a new AuthService over the persisted user registry
    pub fn new(
        storage: Arc<dyn Storage>,
        jwt_secret: String,
        access_token_ttl_seconds: i64,
        bcrypt_cost: u32,
    ) -> Self {
        let users: Vec<User> = load_or_default(storage.as_ref(), keys::USERS);
        tracing::info!(count = users.len(), "Loaded users");

        Self {
            storage,
            users: RwLock::new(users),
            sessions: RwLock::new(HashMap::new()),
            jwt_secret,
            access_token_ttl_seconds,
            bcrypt_cost,
        }
    }

    pub fn jwt_secret(&self) -> &str {
        &self.jwt_secret
    }

    fn persist(&self, users: &[User]) -> Result<(), StorageError> {
        save_json(self.storage.as_ref(), keys::USERS, users)
    }

    /// Register a user; the password is stored only as a bcrypt hash
    pub async fn register(&self, req: RegisterRequest) -> Result<User, AuthError> {
        req.validate()?;

        let email = req.email.trim().to_lowercase();
        if self.find_by_email(&email).await.is_some() {
            return Err(AuthError::EmailTaken);
        }

        let cost = self.bcrypt_cost;
        let password = req.password;
        let password_hash = tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .map_err(|e| AuthError::PasswordHash(e.to_string()))??;

        let user = User {
            id: Uuid::new_v4(),
            role: req.role,
            name: req.name.trim().to_string(),
            email,
            cnic: req.cnic,
            address: req.address,
            phone: req.phone,
            wallet_address: None,
            password_hash,
            created_at: Utc::now(),
        };

        let mut users = self.users.write().await;
        // Re-check under the write lock
        if users.iter().any(|u| u.email == user.email) {
            return Err(AuthError::EmailTaken);
        }
        users.push(user.clone());
        if let Err(e) = self.persist(&users) {
            users.pop();
            return Err(e.into());
        }

        tracing::info!(user_id = %user.id, role = user.role.as_str(), "User registered");
        Ok(user)
    }

    /// Check credentials and open a session
    pub async fn login(&self, req: LoginRequest) -> Result<AuthTokensResponse, AuthError> {
        let email = req.email.trim().to_lowercase();
        let user = self
            .find_by_email(&email)
            .await
            .ok_or(AuthError::InvalidCredentials)?;

        let hash = user.password_hash.clone();
        let password = req.password;
        let valid = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
            .await
            .map_err(|e| AuthError::PasswordHash(e.to_string()))??;

        if !valid {
            tracing::warn!(user_id = %user.id, "Login failed: wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        let tokens = self.issue_tokens(&user).await?;
        tracing::info!(user_id = %user.id, role = user.role.as_str(), "User logged in");
        Ok(tokens)
    }

    async fn find_by_email(&self, email: &str) -> Option<User> {
        let users = self.users.read().await;
        users.iter().find(|u| u.email == email).cloned()
    }

    async fn issue_tokens(&self, user: &User) -> Result<AuthTokensResponse, AuthError> {
        let jti = Uuid::new_v4().to_string();
        let access_token =
            generate_access_token(user, &jti, &self.jwt_secret, self.access_token_ttl_seconds)?;

        let refresh_jti = Uuid::new_v4().to_string();
        let refresh_token =
            generate_refresh_token(user, &refresh_jti, &self.jwt_secret, REFRESH_TOKEN_TTL_DAYS)?;

        let now = Utc::now();
        let session = AuthSession {
            id: Uuid::new_v4(),
            user_id: user.id,
            jti: jti.clone(),
            refresh_token_hash: hash_token(&refresh_token),
            expires_at: now + Duration::days(REFRESH_TOKEN_TTL_DAYS),
            revoked: false,
            created_at: now,
        };
        self.sessions.write().await.insert(jti, session);

        Ok(AuthTokensResponse {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: self.access_token_ttl_seconds,
            dashboard: user.role.dashboard_path(),
            navigation: user.role.navigation(),
            user: user.clone().into(),
        })
    }

    /// Rotate tokens using a valid refresh token
    pub async fn refresh_tokens(&self, refresh_token: &str) -> Result<AuthTokensResponse, AuthError> {
        let claims = verify_token(refresh_token, &self.jwt_secret)?;
        if claims.token_type != TokenType::Refresh {
            return Err(AuthError::InvalidRefreshToken);
        }

        let refresh_token_hash = hash_token(refresh_token);
        let old_jti = {
            let sessions = self.sessions.read().await;
            sessions
                .values()
                .find(|s| {
                    s.refresh_token_hash == refresh_token_hash
                        && !s.revoked
                        && s.expires_at > Utc::now()
                })
                .map(|s| s.jti.clone())
                .ok_or(AuthError::SessionNotFound)?
        };

        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AuthError::InvalidRefreshToken)?;
        let user = self.get_user_by_id(user_id).await?;

        self.sessions.write().await.remove(&old_jti);
        self.issue_tokens(&user).await
    }

    /// Revoke a session (logout)
    pub async fn revoke_session(&self, jti: &str) -> Result<(), AuthError> {
        let mut sessions = self.sessions.write().await;
        match sessions.get_mut(jti) {
            Some(session) if !session.revoked => {
                session.revoked = true;
                tracing::info!(user_id = %session.user_id, "Session revoked");
                Ok(())
            }
            _ => Err(AuthError::SessionNotFound),
        }
    }

    /// Revoke all sessions for a user
    pub async fn revoke_all_sessions(&self, user_id: Uuid) -> u64 {
        let mut sessions = self.sessions.write().await;
        let mut revoked = 0;
        for session in sessions.values_mut() {
            if session.user_id == user_id && !session.revoked {
                session.revoked = true;
                revoked += 1;
            }
        }
        revoked
    }

    /// Verify a session is valid (not revoked)
    pub async fn verify_session(&self, jti: &str) -> Result<AuthSession, AuthError> {
        let sessions = self.sessions.read().await;
        sessions
            .get(jti)
            .filter(|s| !s.revoked && s.expires_at > Utc::now())
            .cloned()
            .ok_or(AuthError::SessionNotFound)
    }

    pub async fn get_user_by_id(&self, user_id: Uuid) -> Result<User, AuthError> {
        let users = self.users.read().await;
        users
            .iter()
            .find(|u| u.id == user_id)
            .cloned()
            .ok_or(AuthError::UserNotFound)
    }

    /// Remember the address of the wallet the user connected
    pub async fn set_wallet_address(
        &self,
        user_id: Uuid,
        address: Option<String>,
    ) -> Result<User, AuthError> {
        let mut users = self.users.write().await;
        let index = users
            .iter()
            .position(|u| u.id == user_id)
            .ok_or(AuthError::UserNotFound)?;

        let previous = users[index].wallet_address.clone();
        users[index].wallet_address = address;
        if let Err(e) = self.persist(&users) {
            users[index].wallet_address = previous;
            return Err(e.into());
        }
        Ok(users[index].clone())
    }
}

/// Hash a token for storage using SHA-256
fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}
