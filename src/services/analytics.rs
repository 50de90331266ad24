//! Analytics service: read-only reports over the stores

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use uuid::Uuid;

use crate::cart::CartStore;
use crate::models::round_money;
use crate::order::{Order, OrderStatus, OrderStore};
use crate::product::{ProductStore, StockLevel};

/// Calendar months covered by vendor analytics
pub const ANALYTICS_MONTHS: u32 = 6;
const TOP_PRODUCT_LIMIT: usize = 5;

#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MonthlySales {
    /// `YYYY-MM`
    pub month: String,
    /// Short month name
    pub label: String,
    pub orders: usize,
    pub customers: usize,
    pub revenue: Decimal,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProductPerformance {
    pub product_id: Uuid,
    pub name: String,
    pub orders: usize,
    pub quantity: u32,
    pub revenue: Decimal,
}

#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct VendorAnalytics {
    pub total_revenue: Decimal,
    pub total_orders: usize,
    pub total_products: usize,
    pub unique_customers: usize,
    pub average_order_value: Decimal,
    /// Oldest month first
    pub monthly: Vec<MonthlySales>,
    pub top_products: Vec<ProductPerformance>,
}

#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct InventoryLine {
    pub product_id: Uuid,
    pub name: String,
    pub category: String,
    pub quantity: u32,
    pub price: Decimal,
    pub value: Decimal,
    pub level: StockLevel,
}

#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct InventoryReport {
    pub total_products: usize,
    pub total_units: u64,
    pub total_value: Decimal,
    pub low_stock: usize,
    pub out_of_stock: usize,
    pub items: Vec<InventoryLine>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StatusCount {
    pub status: OrderStatus,
    pub count: usize,
}

#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CustomerSummary {
    pub total_orders: usize,
    pub total_spent: Decimal,
    pub orders_by_status: Vec<StatusCount>,
    pub cart_items: u32,
    pub cart_total: Decimal,
}

/// Reports for the vendor, supplier and customer dashboards
pub struct AnalyticsService {
    products: Arc<ProductStore>,
    orders: Arc<OrderStore>,
    carts: Arc<CartStore>,
}

impl AnalyticsService {
    pub fn new(products: Arc<ProductStore>, orders: Arc<OrderStore>, carts: Arc<CartStore>) -> Self {
        Self {
            products,
            orders,
            carts,
        }
    }

    pub async fn vendor_analytics(&self, vendor_id: Uuid) -> VendorAnalytics {
        let orders = self.orders.list_by_vendor(vendor_id).await;
        let total_products = self.products.list_by_owner(vendor_id).await.len();
        summarize_vendor(vendor_id, &orders, total_products, Utc::now())
    }

    pub async fn inventory_report(&self, owner_id: Uuid) -> InventoryReport {
        let items: Vec<InventoryLine> = self
            .products
            .list_by_owner(owner_id)
            .await
            .into_iter()
            .map(|p| InventoryLine {
                value: p.price * Decimal::from(p.quantity),
                level: p.stock_level(),
                product_id: p.id,
                name: p.name,
                category: p.category,
                quantity: p.quantity,
                price: p.price,
            })
            .collect();

        let count = |level: StockLevel| items.iter().filter(|i| i.level == level).count();

        InventoryReport {
            total_products: items.len(),
            total_units: items.iter().map(|i| u64::from(i.quantity)).sum(),
            total_value: items.iter().map(|i| i.value).sum(),
            low_stock: count(StockLevel::Low),
            out_of_stock: count(StockLevel::OutOfStock),
            items,
        }
    }

    pub async fn customer_summary(&self, customer_id: Uuid) -> CustomerSummary {
        let orders = self.orders.list_by_customer(customer_id).await;
        let cart = self.carts.summary(customer_id).await;

        CustomerSummary {
            total_orders: orders.len(),
            total_spent: orders.iter().map(|o| o.total).sum(),
            orders_by_status: OrderStatus::ALL
                .iter()
                .map(|&status| StatusCount {
                    status,
                    count: orders.iter().filter(|o| o.status == status).count(),
                })
                .collect(),
            cart_items: cart.item_count,
            cart_total: cart.totals.total,
        }
    }
}

/// Vendor figures count only the vendor's own lines of each order
fn summarize_vendor(
    vendor_id: Uuid,
    orders: &[Order],
    total_products: usize,
    now: DateTime<Utc>,
) -> VendorAnalytics {
    let mut monthly: Vec<(MonthlySales, HashSet<Uuid>)> = last_months(now, ANALYTICS_MONTHS)
        .into_iter()
        .map(|(month, label)| {
            let bucket = MonthlySales {
                month,
                label,
                orders: 0,
                customers: 0,
                revenue: Decimal::ZERO,
            };
            (bucket, HashSet::new())
        })
        .collect();

    let mut total_revenue = Decimal::ZERO;
    let mut customers = HashSet::new();
    let mut products: HashMap<Uuid, ProductPerformance> = HashMap::new();

    for order in orders {
        let revenue: Decimal = order
            .items
            .iter()
            .filter(|item| item.vendor_id == vendor_id)
            .map(|item| {
                let entry = products
                    .entry(item.product_id)
                    .or_insert_with(|| ProductPerformance {
                        product_id: item.product_id,
                        name: item.product_name.clone(),
                        orders: 0,
                        quantity: 0,
                        revenue: Decimal::ZERO,
                    });
                entry.orders += 1;
                entry.quantity += item.quantity;
                entry.revenue += item.line_total();
                item.line_total()
            })
            .sum();

        total_revenue += revenue;
        customers.insert(order.customer_id);

        let key = order.order_date.format("%Y-%m").to_string();
        if let Some((bucket, seen)) = monthly.iter_mut().find(|(b, _)| b.month == key) {
            bucket.orders += 1;
            bucket.revenue += revenue;
            seen.insert(order.customer_id);
        }
    }

    let total_orders = orders.len();
    let average_order_value = if total_orders > 0 {
        round_money(total_revenue / Decimal::from(total_orders))
    } else {
        Decimal::ZERO
    };

    let mut top_products: Vec<ProductPerformance> = products.into_values().collect();
    top_products.sort_by(|a, b| b.revenue.cmp(&a.revenue).then_with(|| a.name.cmp(&b.name)));
    top_products.truncate(TOP_PRODUCT_LIMIT);

    VendorAnalytics {
        total_revenue,
        total_orders,
        total_products,
        unique_customers: customers.len(),
        average_order_value,
        monthly: monthly
            .into_iter()
            .map(|(mut bucket, seen)| {
                bucket.customers = seen.len();
                bucket
            })
            .collect(),
        top_products,
    }
}

/// `(YYYY-MM, short name)` for the `count` months ending at `now`, oldest first
fn last_months(now: DateTime<Utc>, count: u32) -> Vec<(String, String)> {
    let current = now.year() * 12 + now.month0() as i32;
    (0..count as i32)
        .rev()
        .map(|back| {
            let index = current - back;
            let year = index.div_euclid(12);
            let month = index.rem_euclid(12) as u32 + 1;
            let label = NaiveDate::from_ymd_opt(year, month, 1)
                .map(|d| d.format("%b").to_string())
                .unwrap_or_default();
            (format!("{:04}-{:02}", year, month), label)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::OrderItem;
    use chrono::{Duration, TimeZone};

    fn item(vendor_id: Uuid, product_id: Uuid, name: &str, quantity: u32, price: i64) -> OrderItem {
        OrderItem {
            product_id,
            product_name: name.to_string(),
            quantity,
            price: Decimal::from(price),
            vendor_id,
            vendor: "Vendor".to_string(),
        }
    }

    fn order(customer_id: Uuid, items: Vec<OrderItem>, date: DateTime<Utc>) -> Order {
        let subtotal: Decimal = items.iter().map(OrderItem::line_total).sum();
        Order {
            id: Uuid::new_v4(),
            customer_id,
            customer_name: None,
            items,
            subtotal,
            tax: Decimal::ZERO,
            shipping: Decimal::ZERO,
            total: subtotal,
            status: OrderStatus::Pending,
            order_date: date,
            estimated_delivery: date + Duration::days(7),
            updated_at: None,
        }
    }

    #[test]
    fn test_last_months_crosses_year() {
        let now = Utc.with_ymd_and_hms(2024, 2, 15, 12, 0, 0).unwrap();
        let months = last_months(now, 6);
        let keys: Vec<&str> = months.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(
            keys,
            vec!["2023-09", "2023-10", "2023-11", "2023-12", "2024-01", "2024-02"]
        );
        assert_eq!(months[0].1, "Sep");
        assert_eq!(months[5].1, "Feb");
    }

    #[test]
    fn test_vendor_counts_only_own_lines() {
        let now = Utc.with_ymd_and_hms(2024, 6, 20, 12, 0, 0).unwrap();
        let vendor = Uuid::new_v4();
        let other = Uuid::new_v4();
        let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());
        let (lamp, desk) = (Uuid::new_v4(), Uuid::new_v4());

        let orders = vec![
            order(
                alice,
                vec![
                    item(vendor, lamp, "Lamp", 2, 30),
                    item(other, Uuid::new_v4(), "Chair", 1, 500),
                ],
                now - Duration::days(2),
            ),
            order(bob, vec![item(vendor, desk, "Desk", 1, 100)], now),
            // Outside the six month window
            order(
                alice,
                vec![item(vendor, lamp, "Lamp", 1, 30)],
                Utc.with_ymd_and_hms(2023, 11, 1, 0, 0, 0).unwrap(),
            ),
        ];

        let analytics = summarize_vendor(vendor, &orders, 2, now);

        assert_eq!(analytics.total_revenue, Decimal::from(190));
        assert_eq!(analytics.total_orders, 3);
        assert_eq!(analytics.unique_customers, 2);
        assert_eq!(analytics.average_order_value, Decimal::new(6333, 2));
        assert_eq!(analytics.monthly.len(), 6);

        let june = &analytics.monthly[5];
        assert_eq!(june.month, "2024-06");
        assert_eq!(june.orders, 2);
        assert_eq!(june.customers, 2);
        assert_eq!(june.revenue, Decimal::from(160));

        assert_eq!(analytics.top_products[0].name, "Desk");
        assert_eq!(analytics.top_products[1].quantity, 3);
        assert_eq!(analytics.top_products[1].revenue, Decimal::from(90));
    }

    #[test]
    fn test_no_orders() {
        let analytics = summarize_vendor(Uuid::new_v4(), &[], 0, Utc::now());
        assert_eq!(analytics.average_order_value, Decimal::ZERO);
        assert!(analytics.top_products.is_empty());
        assert!(analytics.monthly.iter().all(|m| m.orders == 0));
    }
}
