//! Shared data models for the supply-chain server

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod auth;
pub use auth::*;

/// Registered marketplace user
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub role: UserRole,
    pub name: String,
    pub email: String,
    pub cnic: String,
    pub address: String,
    pub phone: String,
    #[serde(default)]
    pub wallet_address: Option<String>,
    /// bcrypt hash, never the password itself
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// User roles
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Supplier,
    Vendor,
    Customer,
    #[serde(alias = "blockchain-expert")]
    Expert,
}

/// Sidebar entry shown to a role
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
pub struct NavItem {
    pub name: &'static str,
    pub href: &'static str,
}

const fn nav(name: &'static str, href: &'static str) -> NavItem {
    NavItem { name, href }
}

const SUPPLIER_NAV: &[NavItem] = &[
    nav("Dashboard", "/dashboard/supplier"),
    nav("Products", "/products"),
    nav("Inventory", "/inventory"),
    nav("Transactions", "/transactions"),
    nav("Vendors", "/vendors"),
    nav("Analytics", "/analytics"),
];

const VENDOR_NAV: &[NavItem] = &[
    nav("Dashboard", "/dashboard/vendor"),
    nav("Add Product", "/add-product"),
    nav("My Products", "/my-products"),
    nav("Orders", "/orders"),
    nav("Customers", "/customers"),
    nav("Analytics", "/analytics"),
    nav("Sales History", "/sales-history"),
];

const CUSTOMER_NAV: &[NavItem] = &[
    nav("Dashboard", "/dashboard/customer"),
    nav("Browse Products", "/browse"),
    nav("My Cart", "/cart"),
    nav("Order History", "/order-history"),
    nav("Track Orders", "/track-orders"),
];

const EXPERT_NAV: &[NavItem] = &[
    nav("Dashboard", "/dashboard/expert"),
    nav("All Transactions", "/all-transactions"),
    nav("Blockchain Logs", "/blockchain-logs"),
    nav("Consensus", "/consensus"),
    nav("Security", "/security"),
    nav("Fault Tolerance", "/fault-tolerance"),
    nav("System Health", "/system-health"),
];

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Supplier => "supplier",
            UserRole::Vendor => "vendor",
            UserRole::Customer => "customer",
            UserRole::Expert => "expert",
        }
    }

    /// Landing route of the role's dashboard
    pub fn dashboard_path(&self) -> &'static str {
        match self {
            UserRole::Supplier => "/dashboard/supplier",
            UserRole::Vendor => "/dashboard/vendor",
            UserRole::Customer => "/dashboard/customer",
            UserRole::Expert => "/dashboard/expert",
        }
    }

    /// Navigation entries visible to the role
    pub fn navigation(&self) -> &'static [NavItem] {
        match self {
            UserRole::Supplier => SUPPLIER_NAV,
            UserRole::Vendor => VENDOR_NAV,
            UserRole::Customer => CUSTOMER_NAV,
            UserRole::Expert => EXPERT_NAV,
        }
    }
}

/// Public view of a user
#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub role: UserRole,
    pub name: String,
    pub email: String,
    pub cnic: String,
    pub address: String,
    pub phone: String,
    pub wallet_address: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            role: user.role,
            name: user.name,
            email: user.email,
            cnic: user.cnic,
            address: user.address,
            phone: user.phone,
            wallet_address: user.wallet_address,
            created_at: user.created_at,
        }
    }
}

/// Highest accepted unit price
///
/// With `u32` quantities this keeps every line, cart and order total far
/// below `Decimal::MAX`, so money arithmetic cannot overflow.
pub const MAX_UNIT_PRICE: Decimal = Decimal::from_parts(1_000_000_000, 0, 0, false, 0);

/// Round a money amount to cents
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serialization() {
        assert_eq!(
            serde_json::to_string(&UserRole::Expert).unwrap(),
            "\"expert\""
        );
        let role: UserRole = serde_json::from_str("\"blockchain-expert\"").unwrap();
        assert_eq!(role, UserRole::Expert);
    }

    #[test]
    fn test_navigation_starts_with_dashboard() {
        for role in [
            UserRole::Supplier,
            UserRole::Vendor,
            UserRole::Customer,
            UserRole::Expert,
        ] {
            let nav = role.navigation();
            assert_eq!(nav[0].name, "Dashboard");
            assert_eq!(nav[0].href, role.dashboard_path());
        }
        assert!(UserRole::Customer
            .navigation()
            .iter()
            .any(|item| item.href == "/cart"));
    }
}
