//! Cart models

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::order::OrderTotals;
use crate::product::{Product, StockLine};

/// Product snapshot with the quantity in the cart
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    /// Product id
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    pub category: String,
    pub supplier_id: Uuid,
    pub supplier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub quantity: u32,
}

impl CartItem {
    pub(crate) fn from_product(product: &Product, quantity: u32) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            description: product.description.clone(),
            price: product.price,
            category: product.category.clone(),
            supplier_id: product.supplier_id,
            supplier: product.supplier.clone(),
            image: product.image.clone(),
            quantity,
        }
    }

    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }

    pub fn stock_line(&self) -> StockLine {
        StockLine {
            product_id: self.id,
            quantity: self.quantity,
        }
    }
}

/// Cart contents with pricing
#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CartSummary {
    pub items: Vec<CartItem>,
    /// Units across all lines
    pub item_count: u32,
    #[serde(flatten)]
    pub totals: OrderTotals,
}

/// Request DTO for adding a product to the cart
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    pub product_id: Uuid,
}

/// Request DTO for changing a line quantity
#[derive(Debug, Deserialize)]
pub struct SetQuantityRequest {
    pub quantity: u32,
}
