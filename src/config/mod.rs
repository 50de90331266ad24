//! Configuration management for the supply-chain server
//!
//! This module handles loading and validating configuration from environment variables,
//! with support for different environments (development, staging, production).

use rust_decimal::Decimal;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid environment value: {0}")]
    InvalidValue(String),

    #[error("Invalid port number: {0}")]
    InvalidPort(String),

    #[error("Invalid decimal for {0}")]
    InvalidDecimal(String),
}

/// Application environment
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    /// Parse environment from string
    pub fn from_str(s: &str) -> Result<Self, ConfigError> {
        match s.to_lowercase().as_str() {
            "dev" | "development" => Ok(Environment::Development),
            "staging" => Ok(Environment::Staging),
            "prod" | "production" => Ok(Environment::Production),
            _ => Err(ConfigError::InvalidValue(format!(
                "Invalid environment: '{}'. Expected: dev, staging, or prod",
                s
            ))),
        }
    }

    /// Check if this is a production environment
    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }

    /// Get the environment name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }
}

/// Where the stores persist their collections
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    /// One JSON file per key under the data directory
    File(PathBuf),
    /// Volatile, lost on restart
    Memory,
}

/// Order pricing rules applied to carts
#[derive(Debug, Clone, PartialEq)]
pub struct PricingConfig {
    /// Tax rate applied to the subtotal (0.08 = 8%)
    pub tax_rate: Decimal,
    /// Subtotals strictly above this ship free
    pub free_shipping_threshold: Decimal,
    /// Flat shipping fee below the threshold
    pub shipping_fee: Decimal,
    /// Markup applied to supplier shipments (1.2 = 20%)
    pub shipment_markup: Decimal,
    /// Days between checkout and estimated delivery
    pub delivery_days: i64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            tax_rate: Decimal::new(8, 2),
            free_shipping_threshold: Decimal::from(100),
            shipping_fee: Decimal::from(10),
            shipment_markup: Decimal::new(12, 1),
            delivery_days: 7,
        }
    }
}

/// Simulated wallet behaviour
#[derive(Debug, Clone, PartialEq)]
pub struct WalletConfig {
    /// Balance credited to freshly created wallets
    pub starting_balance: Decimal,
    /// Delay before a pending transfer is confirmed
    pub confirmation_delay: Duration,
    /// Artificial latency of connect/create calls
    pub network_latency: Duration,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            starting_balance: Decimal::from(5000),
            confirmation_delay: Duration::from_millis(2000),
            network_latency: Duration::from_millis(500),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Current environment
    pub environment: Environment,

    /// Server port
    pub port: u16,

    /// Persistence backend
    pub storage: StorageBackend,

    /// Rate limit: requests per second per IP
    pub rate_limit_rps: u32,

    /// CORS allowed origins
    pub cors_allowed_origins: Option<String>,

    /// Log level (RUST_LOG)
    pub log_level: String,

    /// JWT secret for token signing
    pub jwt_secret: String,

    /// Access token TTL in seconds (default: 86400 = 1 day)
    pub jwt_ttl_seconds: i64,

    /// bcrypt work factor for password hashes
    pub bcrypt_cost: u32,

    pub pricing: PricingConfig,

    pub wallet: WalletConfig,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors)
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .map(|s| Environment::from_str(&s))
            .unwrap_or(Ok(Environment::Development))?;

        let port = env::var("PORT")
            .unwrap_or_else(|_| "3001".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort("PORT must be a valid number".to_string()))?;

        let storage = match env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "file".to_string())
            .to_lowercase()
            .as_str()
        {
            "memory" => StorageBackend::Memory,
            "file" => StorageBackend::File(PathBuf::from(
                env::var("DATA_DIR").unwrap_or_else(|_| "./data".to_string()),
            )),
            other => {
                return Err(ConfigError::InvalidValue(format!(
                    "Invalid storage backend: '{}'. Expected: file or memory",
                    other
                )))
            }
        };

        let rate_limit_rps = env::var("RATE_LIMIT_RPS")
            .unwrap_or_else(|_| "100".to_string())
            .parse::<u32>()
            .unwrap_or(100);

        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS").ok();

        let log_level = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let jwt_secret = env::var("JWT_SECRET")
            .unwrap_or_else(|_| "development-secret-change-in-production".to_string());

        if environment.is_production() && jwt_secret.starts_with("development-") {
            return Err(ConfigError::InvalidValue(
                "JWT_SECRET must be set in production".to_string(),
            ));
        }

        let jwt_ttl_seconds = env::var("JWT_TTL_SECONDS")
            .unwrap_or_else(|_| "86400".to_string())
            .parse::<i64>()
            .unwrap_or(86400);

        let bcrypt_cost = env::var("BCRYPT_COST")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(bcrypt::DEFAULT_COST);

        let defaults = PricingConfig::default();
        let pricing = PricingConfig {
            tax_rate: decimal_var("TAX_RATE", defaults.tax_rate)?,
            free_shipping_threshold: decimal_var(
                "FREE_SHIPPING_THRESHOLD",
                defaults.free_shipping_threshold,
            )?,
            shipping_fee: decimal_var("SHIPPING_FEE", defaults.shipping_fee)?,
            shipment_markup: decimal_var("SHIPMENT_MARKUP", defaults.shipment_markup)?,
            delivery_days: env::var("DELIVERY_DAYS")
                .ok()
                .and_then(|s| s.parse::<i64>().ok())
                .unwrap_or(defaults.delivery_days),
        };

        let defaults = WalletConfig::default();
        let wallet = WalletConfig {
            starting_balance: decimal_var("WALLET_STARTING_BALANCE", defaults.starting_balance)?,
            confirmation_delay: millis_var(
                "WALLET_CONFIRMATION_DELAY_MS",
                defaults.confirmation_delay,
            ),
            network_latency: millis_var("WALLET_NETWORK_LATENCY_MS", defaults.network_latency),
        };

        Ok(Config {
            environment,
            port,
            storage,
            rate_limit_rps,
            cors_allowed_origins,
            log_level,
            jwt_secret,
            jwt_ttl_seconds,
            bcrypt_cost,
            pricing,
            wallet,
        })
    }
}

fn decimal_var(name: &str, default: Decimal) -> Result<Decimal, ConfigError> {
    match env::var(name) {
        Ok(raw) => Decimal::from_str(raw.trim())
            .map_err(|_| ConfigError::InvalidDecimal(name.to_string())),
        Err(_) => Ok(default),
    }
}

fn millis_var(name: &str, default: Duration) -> Duration {
    env::var(name)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_from_str() {
        assert_eq!(
            Environment::from_str("dev").unwrap(),
            Environment::Development
        );
        assert_eq!(
            Environment::from_str("staging").unwrap(),
            Environment::Staging
        );
        assert_eq!(
            Environment::from_str("production").unwrap(),
            Environment::Production
        );

        // Case insensitive
        assert_eq!(
            Environment::from_str("PROD").unwrap(),
            Environment::Production
        );

        assert!(Environment::from_str("invalid").is_err());
    }

    #[test]
    fn test_environment_as_str() {
        assert_eq!(Environment::Development.as_str(), "development");
        assert_eq!(Environment::Staging.as_str(), "staging");
        assert_eq!(Environment::Production.as_str(), "production");
        assert!(!Environment::default().is_production());
    }

    #[test]
    fn test_pricing_defaults() {
        let pricing = PricingConfig::default();
        assert_eq!(pricing.tax_rate.to_string(), "0.08");
        assert_eq!(pricing.free_shipping_threshold, Decimal::from(100));
        assert_eq!(pricing.shipping_fee, Decimal::from(10));
        assert_eq!(pricing.shipment_markup.to_string(), "1.2");
        assert_eq!(pricing.delivery_days, 7);
    }

    #[test]
    fn test_wallet_defaults() {
        let wallet = WalletConfig::default();
        assert_eq!(wallet.starting_balance, Decimal::from(5000));
        assert_eq!(wallet.confirmation_delay, Duration::from_secs(2));
    }

    #[test]
    fn test_config_error_types() {
        let err = ConfigError::InvalidDecimal("TAX_RATE".to_string());
        assert!(err.to_string().contains("TAX_RATE"));

        let err = ConfigError::InvalidPort("invalid".to_string());
        assert!(err.to_string().contains("invalid"));
    }
}
