//! Authentication module for the supply-chain server
//!
//! - Registration with validated identity fields
//! - bcrypt password hashing and login
//! - JWT access/refresh tokens backed by revocable sessions

mod jwt;
mod service;

pub use jwt::{
    generate_access_token, generate_refresh_token, get_user_id_from_claims, verify_token, Claims,
    JwtError, TokenType,
};
pub use service::{AuthError, AuthService};
