//! Order models and the order status state machine

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::PricingConfig;
use crate::models::round_money;

/// Fulfilment status; moves forward one step at a time
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Processing,
    InTransit,
    Delivered,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 4] = [
        OrderStatus::Pending,
        OrderStatus::Processing,
        OrderStatus::InTransit,
        OrderStatus::Delivered,
    ];

    /// Immediate successor, `None` once delivered
    pub fn next(&self) -> Option<OrderStatus> {
        match self {
            OrderStatus::Pending => Some(OrderStatus::Processing),
            OrderStatus::Processing => Some(OrderStatus::InTransit),
            OrderStatus::InTransit => Some(OrderStatus::Delivered),
            OrderStatus::Delivered => None,
        }
    }

    pub fn can_transition_to(&self, to: OrderStatus) -> bool {
        self.next() == Some(to)
    }

    pub fn is_terminal(&self) -> bool {
        self.next().is_none()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::InTransit => "in_transit",
            OrderStatus::Delivered => "delivered",
        }
    }
}

/// Line item copied from the cart at checkout
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: u32,
    pub price: Decimal,
    pub vendor_id: Uuid,
    pub vendor: String,
}

impl OrderItem {
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

/// Money breakdown of a cart or order
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct OrderTotals {
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub shipping: Decimal,
    pub total: Decimal,
}

impl OrderTotals {
    /// Price a subtotal: tax rounded to cents, free shipping strictly above
    /// the threshold, no shipping for an empty cart
    pub fn from_subtotal(subtotal: Decimal, pricing: &PricingConfig) -> Self {
        if subtotal.is_zero() {
            return Self::default();
        }

        let tax = round_money(subtotal * pricing.tax_rate);
        let shipping = if subtotal > pricing.free_shipping_threshold {
            Decimal::ZERO
        } else {
            pricing.shipping_fee
        };

        Self {
            subtotal,
            tax,
            shipping,
            total: subtotal + tax + shipping,
        }
    }

    pub fn is_consistent(&self) -> bool {
        self.total == self.subtotal + self.tax + self.shipping
    }
}

/// Customer order
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub customer_id: Uuid,
    #[serde(default)]
    pub customer_name: Option<String>,
    pub items: Vec<OrderItem>,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub shipping: Decimal,
    pub total: Decimal,
    pub status: OrderStatus,
    pub order_date: DateTime<Utc>,
    pub estimated_delivery: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Order {
    pub fn totals(&self) -> OrderTotals {
        OrderTotals {
            subtotal: self.subtotal,
            tax: self.tax,
            shipping: self.shipping,
            total: self.total,
        }
    }

    /// Distinct vendors in item order
    pub fn vendor_ids(&self) -> Vec<Uuid> {
        let mut vendors = Vec::new();
        for item in &self.items {
            if !vendors.contains(&item.vendor_id) {
                vendors.push(item.vendor_id);
            }
        }
        vendors
    }

    pub fn has_vendor(&self, vendor_id: Uuid) -> bool {
        self.items.iter().any(|item| item.vendor_id == vendor_id)
    }
}

/// Order to create
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub customer_id: Uuid,
    pub customer_name: Option<String>,
    pub items: Vec<OrderItem>,
    pub totals: OrderTotals,
    pub estimated_delivery: DateTime<Utc>,
}

/// Request DTO for a status change
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
}
