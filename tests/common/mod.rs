//! Shared fixtures for the integration tests

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use uuid::Uuid;

use supplychain_server::config::{
    Config, Environment, PricingConfig, StorageBackend, WalletConfig,
};
use supplychain_server::product::{NewProduct, Product};
use supplychain_server::state::AppState;
use supplychain_server::storage::{MemoryStorage, Storage};

pub fn test_config(starting_balance: i64) -> Config {
    Config {
        environment: Environment::Development,
        port: 0,
        storage: StorageBackend::Memory,
        rate_limit_rps: 1000,
        cors_allowed_origins: None,
        log_level: "debug".to_string(),
        jwt_secret: "integration-test-secret".to_string(),
        jwt_ttl_seconds: 3600,
        bcrypt_cost: 4,
        pricing: PricingConfig::default(),
        wallet: WalletConfig {
            starting_balance: Decimal::from(starting_balance),
            confirmation_delay: Duration::from_millis(2000),
            network_latency: Duration::ZERO,
        },
    }
}

pub fn memory_state(config: &Config) -> AppState {
    let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
    AppState::new(storage, config).unwrap()
}

pub async fn vendor_product(
    state: &AppState,
    vendor_id: Uuid,
    price: i64,
    quantity: u32,
) -> Product {
    state
        .product_store
        .add(
            vendor_id,
            "Test Vendor",
            NewProduct {
                name: "Test Crate".to_string(),
                description: "Shipping crate".to_string(),
                price: Decimal::from(price),
                quantity,
                category: "Logistics".to_string(),
                image: None,
            },
        )
        .await
        .unwrap()
}
