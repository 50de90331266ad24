//! Route definitions for the supply-chain API

mod analytics;
mod auth;
mod cart;
mod dashboard;
mod orders;
mod products;
mod transactions;
mod wallet;

pub use analytics::analytics_routes;
pub use auth::auth_routes;
pub use cart::cart_routes;
pub use dashboard::dashboard_routes;
pub use orders::order_routes;
pub use products::product_routes;
pub use transactions::transaction_routes;
pub use wallet::wallet_routes;

use axum::http::{HeaderValue, Method};
use axum::{routing::get, Router};
use tower_http::cors::{Any, CorsLayer};

use crate::config::Config;
use crate::handlers::health;
use crate::middleware::{self, RateLimiter};
use crate::state::AppState;
use crate::websocket;

/// Assemble the full application with its middleware stack
pub fn app_router(state: AppState, config: &Config, rate_limiter: RateLimiter) -> Router {
    let app = Router::new()
        .route("/", get(health::root))
        .route("/health", get(health::health_check))
        .route("/ws", get(websocket::ws_handler))
        .merge(auth_routes())
        .merge(product_routes())
        .merge(cart_routes())
        .merge(order_routes())
        .merge(wallet_routes())
        .merge(transaction_routes())
        .merge(dashboard_routes())
        .merge(analytics_routes())
        .with_state(state)
        .layer(axum::middleware::from_fn(middleware::security_headers));

    let app = if config.environment.is_production() {
        app.layer(axum::middleware::from_fn(middleware::hsts_header))
    } else {
        app
    };

    app.layer(axum::middleware::from_fn(middleware::request_tracing))
        .layer(axum::middleware::from_fn(move |req, next| {
            let limiter = rate_limiter.clone();
            middleware::rate_limit_layer(limiter)(req, next)
        }))
        .layer(configure_cors(config.cors_allowed_origins.as_deref()))
}

fn configure_cors(allowed_origins: Option<&str>) -> CorsLayer {
    let allowed_origins = allowed_origins.unwrap_or_default().trim();

    if allowed_origins.is_empty() {
        tracing::warn!("CORS_ALLOWED_ORIGINS not set, allowing all origins (permissive)");
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .split(',')
        .filter_map(|s| s.trim().parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any)
}
