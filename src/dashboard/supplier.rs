//! Supplier dashboard: bulk inventory, vendor partners and supply records

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::DashboardError;
use crate::ledger::TransactionType;
use crate::models::{round_money, MAX_UNIT_PRICE};
use crate::storage::{keys, load_or_default, save_json, Storage};

/// Number of supply records kept on the dashboard
pub const RECENT_RECORD_LIMIT: usize = 10;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub supplier: String,
}

impl InventoryItem {
    pub fn value(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// Inbound purchase or outbound shipment
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SupplyRecord {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub record_type: TransactionType,
    /// Counterparty: the vendor shipped to, or the supplier bought from
    pub vendor: String,
    pub product: String,
    pub units: u32,
    /// Negative for purchases
    pub amount: Decimal,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VendorPartner {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    pub monthly_revenue: Decimal,
    pub growth: Decimal,
    pub total_orders: u32,
}

/// Persisted supplier view model
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct SupplierDashboard {
    #[serde(default)]
    pub inventory: Vec<InventoryItem>,
    #[serde(default)]
    pub vendor_performance: Vec<VendorPartner>,
    /// Newest first
    #[serde(default)]
    pub recent_transactions: Vec<SupplyRecord>,
}

impl SupplierDashboard {
    pub fn stats(&self) -> SupplierStats {
        SupplierStats {
            total_inventory: self.inventory.iter().map(|i| u64::from(i.quantity)).sum(),
            vendor_partners: self.vendor_performance.len(),
            total_transactions: self.recent_transactions.len(),
            supply_value: self.inventory.iter().map(InventoryItem::value).sum(),
        }
    }

    fn record(&mut self, record: SupplyRecord) {
        self.recent_transactions.insert(0, record);
        self.recent_transactions.truncate(RECENT_RECORD_LIMIT);
    }

    fn find_item_mut(&mut self, name: &str) -> Option<&mut InventoryItem> {
        let name = name.trim().to_lowercase();
        self.inventory
            .iter_mut()
            .find(|item| item.name.to_lowercase() == name)
    }
}

#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SupplierStats {
    pub total_inventory: u64,
    pub vendor_partners: usize,
    pub total_transactions: usize,
    pub supply_value: Decimal,
}

/// Dashboard plus derived stats
#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SupplierDashboardView {
    #[serde(flatten)]
    pub dashboard: SupplierDashboard,
    pub stats: SupplierStats,
}

impl From<SupplierDashboard> for SupplierDashboardView {
    fn from(dashboard: SupplierDashboard) -> Self {
        Self {
            stats: dashboard.stats(),
            dashboard,
        }
    }
}

// ============================================================================
// Request DTOs
// ============================================================================

#[derive(Debug, Deserialize, Validate, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AddInventoryRequest {
    #[validate(length(min = 1, message = "Item name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "Category is required"))]
    pub category: String,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: u32,
    #[validate(custom = "validate_unit_price")]
    pub unit_price: Decimal,
    #[validate(length(min = 1, message = "Supplier is required"))]
    pub supplier: String,
}

#[derive(Debug, Deserialize, Validate, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ShipmentRequest {
    #[validate(length(min = 1, message = "Vendor is required"))]
    pub vendor: String,
    #[validate(length(min = 1, message = "Product is required"))]
    pub product: String,
    #[validate(range(min = 1, message = "Units must be at least 1"))]
    pub units: u32,
}

#[derive(Debug, Deserialize, Validate, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AddVendorRequest {
    #[validate(length(min = 1, message = "Vendor name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "Category is required"))]
    pub category: String,
}

fn validate_unit_price(price: &Decimal) -> Result<(), ValidationError> {
    if price.is_sign_negative() && !price.is_zero() {
        let mut err = ValidationError::new("negative_price");
        err.message = Some("Unit price must not be negative".into());
        return Err(err);
    }
    if *price > MAX_UNIT_PRICE {
        let mut err = ValidationError::new("price_too_high");
        err.message = Some(format!("Unit price must not exceed {}", MAX_UNIT_PRICE).into());
        return Err(err);
    }
    Ok(())
}

/// Supplier dashboards, loaded per user on first access
pub struct SupplierDashboards {
    storage: Arc<dyn Storage>,
    shipment_markup: Decimal,
    dashboards: RwLock<HashMap<Uuid, SupplierDashboard>>,
}

impl SupplierDashboards {
    pub fn new(storage: Arc<dyn Storage>, shipment_markup: Decimal) -> Self {
        Self {
            storage,
            shipment_markup,
            dashboards: RwLock::new(HashMap::new()),
        }
    }

    fn dashboard_mut<'a>(
        &self,
        dashboards: &'a mut HashMap<Uuid, SupplierDashboard>,
        user_id: Uuid,
    ) -> &'a mut SupplierDashboard {
        dashboards.entry(user_id).or_insert_with(|| {
            load_or_default(self.storage.as_ref(), &keys::supplier_dashboard(user_id))
        })
    }

    /// Persist `dashboard`, restoring `previous` on failure
    fn commit(
        &self,
        user_id: Uuid,
        dashboard: &mut SupplierDashboard,
        previous: SupplierDashboard,
    ) -> Result<SupplierDashboardView, DashboardError> {
        if let Err(e) = save_json(
            self.storage.as_ref(),
            &keys::supplier_dashboard(user_id),
            dashboard,
        ) {
            *dashboard = previous;
            return Err(e.into());
        }
        Ok(dashboard.clone().into())
    }

    pub async fn get(&self, user_id: Uuid) -> SupplierDashboardView {
        let mut dashboards = self.dashboards.write().await;
        self.dashboard_mut(&mut dashboards, user_id).clone().into()
    }

    /// Receive stock; merges into an item of the same name
    pub async fn add_inventory(
        &self,
        user_id: Uuid,
        mut req: AddInventoryRequest,
    ) -> Result<SupplierDashboardView, DashboardError> {
        req.name = req.name.trim().to_string();
        req.validate()?;

        let mut dashboards = self.dashboards.write().await;
        let dashboard = self.dashboard_mut(&mut dashboards, user_id);
        let previous = dashboard.clone();

        match dashboard.find_item_mut(&req.name) {
            Some(item) => item.quantity = item.quantity.saturating_add(req.quantity),
            None => dashboard.inventory.push(InventoryItem {
                id: Uuid::new_v4(),
                name: req.name.clone(),
                category: req.category.clone(),
                quantity: req.quantity,
                unit_price: req.unit_price,
                supplier: req.supplier.clone(),
            }),
        }

        dashboard.record(SupplyRecord {
            id: Uuid::new_v4(),
            record_type: TransactionType::Purchase,
            vendor: req.supplier,
            product: req.name,
            units: req.quantity,
            amount: -round_money(req.unit_price * Decimal::from(req.quantity)),
            timestamp: Utc::now(),
        });

        let view = self.commit(user_id, dashboard, previous)?;
        tracing::info!(user = %user_id, units = req.quantity, "Inventory received");
        Ok(view)
    }

    /// Ship units of an inventory item to a vendor at the configured markup
    pub async fn record_shipment(
        &self,
        user_id: Uuid,
        req: ShipmentRequest,
    ) -> Result<SupplierDashboardView, DashboardError> {
        req.validate()?;

        let mut dashboards = self.dashboards.write().await;
        let dashboard = self.dashboard_mut(&mut dashboards, user_id);
        let previous = dashboard.clone();

        let item = dashboard
            .find_item_mut(&req.product)
            .ok_or_else(|| DashboardError::InventoryItemNotFound(req.product.clone()))?;
        if item.quantity < req.units {
            return Err(DashboardError::InsufficientInventory {
                name: item.name.clone(),
                available: item.quantity,
                requested: req.units,
            });
        }
        item.quantity -= req.units;

        let amount =
            round_money(Decimal::from(req.units) * item.unit_price * self.shipment_markup);
        let product = item.name.clone();

        dashboard.record(SupplyRecord {
            id: Uuid::new_v4(),
            record_type: TransactionType::Sale,
            vendor: req.vendor,
            product,
            units: req.units,
            amount,
            timestamp: Utc::now(),
        });

        let view = self.commit(user_id, dashboard, previous)?;
        tracing::info!(user = %user_id, units = req.units, amount = %amount, "Shipment recorded");
        Ok(view)
    }

    pub async fn add_vendor(
        &self,
        user_id: Uuid,
        req: AddVendorRequest,
    ) -> Result<SupplierDashboardView, DashboardError> {
        req.validate()?;

        let mut dashboards = self.dashboards.write().await;
        let dashboard = self.dashboard_mut(&mut dashboards, user_id);
        let previous = dashboard.clone();

        dashboard.vendor_performance.push(VendorPartner {
            id: Uuid::new_v4(),
            name: req.name,
            category: req.category,
            monthly_revenue: Decimal::ZERO,
            growth: Decimal::ZERO,
            total_orders: 0,
        });

        self.commit(user_id, dashboard, previous)
    }

    /// Clear the dashboard and its stored copy
    pub async fn reset(&self, user_id: Uuid) -> Result<SupplierDashboardView, DashboardError> {
        let mut dashboards = self.dashboards.write().await;
        self.storage
            .remove_item(&keys::supplier_dashboard(user_id))?;
        dashboards.insert(user_id, SupplierDashboard::default());

        tracing::info!(user = %user_id, "Supplier dashboard reset");
        Ok(SupplierDashboard::default().into())
    }
}
