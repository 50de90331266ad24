//! Application state shared across handlers

use std::sync::Arc;

use axum::extract::FromRef;

use crate::auth::AuthService;
use crate::cart::{CartStore, CheckoutService};
use crate::config::Config;
use crate::dashboard::{ExpertDashboardService, SupplierDashboards};
use crate::ledger::TransactionStore;
use crate::order::OrderStore;
use crate::product::{ProductError, ProductStore};
use crate::services::AnalyticsService;
use crate::storage::Storage;
use crate::wallet::WalletService;
use crate::websocket::WsState;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<AuthService>,
    pub product_store: Arc<ProductStore>,
    pub order_store: Arc<OrderStore>,
    pub ledger: Arc<TransactionStore>,
    pub wallet_service: Arc<WalletService>,
    pub cart_store: Arc<CartStore>,
    pub checkout_service: Arc<CheckoutService>,
    pub supplier_dashboards: Arc<SupplierDashboards>,
    pub expert_dashboard: Arc<ExpertDashboardService>,
    pub analytics: Arc<AnalyticsService>,
    pub ws_state: WsState,
}

impl AppState {
    /// Load every store from `storage` and wire them together
    pub fn new(storage: Arc<dyn Storage>, config: &Config) -> Result<Self, ProductError> {
        let ledger = Arc::new(TransactionStore::load(storage.clone()));
        let product_store = Arc::new(ProductStore::load(storage.clone())?);
        let order_store = Arc::new(OrderStore::load(storage.clone(), ledger.clone()));
        let wallet_service = Arc::new(WalletService::load(
            storage.clone(),
            ledger.clone(),
            config.wallet.clone(),
        ));
        let cart_store = Arc::new(CartStore::new(
            storage.clone(),
            product_store.clone(),
            config.pricing.clone(),
        ));
        let checkout_service = Arc::new(CheckoutService::new(
            cart_store.clone(),
            product_store.clone(),
            order_store.clone(),
            wallet_service.clone(),
        ));
        let auth_service = Arc::new(AuthService::new(
            storage.clone(),
            config.jwt_secret.clone(),
            config.jwt_ttl_seconds,
            config.bcrypt_cost,
        ));
        let supplier_dashboards = Arc::new(SupplierDashboards::new(
            storage.clone(),
            config.pricing.shipment_markup,
        ));
        let expert_dashboard = Arc::new(ExpertDashboardService::load(storage, ledger.clone()));
        let analytics = Arc::new(AnalyticsService::new(
            product_store.clone(),
            order_store.clone(),
            cart_store.clone(),
        ));
        let ws_state = WsState::new(ledger.clone());

        Ok(Self {
            auth_service,
            product_store,
            order_store,
            ledger,
            wallet_service,
            cart_store,
            checkout_service,
            supplier_dashboards,
            expert_dashboard,
            analytics,
            ws_state,
        })
    }
}

impl FromRef<AppState> for WsState {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.ws_state.clone()
    }
}

impl FromRef<AppState> for Arc<AuthService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.auth_service.clone()
    }
}
