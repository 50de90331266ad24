//! Order store - customer orders and their fulfilment status

use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::ledger::{
    LedgerError, NewTransaction, TransactionStatus, TransactionStore, TransactionType,
};
use crate::order::{NewOrder, Order, OrderStatus};
use crate::storage::{keys, load_or_default, save_json, Storage, StorageError};

/// Order store errors
#[derive(Error, Debug)]
pub enum OrderError {
    #[error("Order must contain at least one item")]
    EmptyOrder,

    #[error("Order totals do not add up: expected {expected}, got {actual}")]
    TotalMismatch { expected: Decimal, actual: Decimal },

    #[error("Order not found: {0}")]
    NotFound(Uuid),

    #[error("Invalid status transition from {} to {}", .from.as_str(), .to.as_str())]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Orders backed by `supply_chain_orders`
pub struct OrderStore {
    storage: Arc<dyn Storage>,
    ledger: Arc<TransactionStore>,
    orders: RwLock<Vec<Order>>,
}

impl OrderStore {
    pub fn load(storage: Arc<dyn Storage>, ledger: Arc<TransactionStore>) -> Self {
        let orders: Vec<Order> = load_or_default(storage.as_ref(), keys::ORDERS);
        tracing::info!(count = orders.len(), "Loaded orders");

        Self {
            storage,
            ledger,
            orders: RwLock::new(orders),
        }
    }

    fn persist(&self, orders: &[Order]) -> Result<(), StorageError> {
        save_json(self.storage.as_ref(), keys::ORDERS, orders)
    }

    /// Create a pending order and record its purchase on the ledger
    pub async fn create(&self, new_order: NewOrder) -> Result<Order, OrderError> {
        if new_order.items.is_empty() {
            return Err(OrderError::EmptyOrder);
        }

        let totals = new_order.totals;
        let line_sum: Decimal = new_order.items.iter().map(|item| item.line_total()).sum();
        if line_sum != totals.subtotal {
            return Err(OrderError::TotalMismatch {
                expected: line_sum,
                actual: totals.subtotal,
            });
        }
        if !totals.is_consistent() {
            return Err(OrderError::TotalMismatch {
                expected: totals.subtotal + totals.tax + totals.shipping,
                actual: totals.total,
            });
        }

        let order = Order {
            id: Uuid::new_v4(),
            customer_id: new_order.customer_id,
            customer_name: new_order.customer_name,
            items: new_order.items,
            subtotal: totals.subtotal,
            tax: totals.tax,
            shipping: totals.shipping,
            total: totals.total,
            status: OrderStatus::Pending,
            order_date: Utc::now(),
            estimated_delivery: new_order.estimated_delivery,
            updated_at: None,
        };

        let mut orders = self.orders.write().await;
        orders.push(order.clone());
        if let Err(e) = self.persist(&orders) {
            orders.pop();
            return Err(e.into());
        }

        let mut purchase = NewTransaction::new(
            TransactionType::Purchase,
            order.total,
            TransactionStatus::Confirmed,
        );
        purchase.order_id = Some(order.id);
        purchase.initiator_id = Some(order.customer_id);
        purchase.vendor_ids = order.vendor_ids();

        if let Err(e) = self.ledger.append(purchase).await {
            tracing::error!(order_id = %order.id, error = %e, "Ledger append failed, rolling back order");
            orders.pop();
            if let Err(persist_err) = self.persist(&orders) {
                tracing::error!(error = %persist_err, "Failed to persist order rollback");
            }
            return Err(e.into());
        }

        tracing::info!(
            order_id = %order.id,
            customer = %order.customer_id,
            total = %order.total,
            items = order.items.len(),
            "Order created"
        );

        Ok(order)
    }

    /// Move an order to `status`, which must be its immediate successor
    pub async fn update_status(&self, id: Uuid, status: OrderStatus) -> Result<Order, OrderError> {
        let mut orders = self.orders.write().await;
        let index = orders
            .iter()
            .position(|o| o.id == id)
            .ok_or(OrderError::NotFound(id))?;

        let from = orders[index].status;
        if !from.can_transition_to(status) {
            return Err(OrderError::InvalidTransition { from, to: status });
        }

        let previous = orders[index].clone();
        orders[index].status = status;
        orders[index].updated_at = Some(Utc::now());

        if let Err(e) = self.persist(&orders) {
            orders[index] = previous;
            return Err(e.into());
        }

        tracing::info!(
            order_id = %id,
            from = from.as_str(),
            to = status.as_str(),
            "Order status updated"
        );
        Ok(orders[index].clone())
    }

    /// Move an order to its next status
    pub async fn advance(&self, id: Uuid) -> Result<Order, OrderError> {
        let current = self.get(id).await.ok_or(OrderError::NotFound(id))?.status;
        match current.next() {
            Some(next) => self.update_status(id, next).await,
            None => Err(OrderError::InvalidTransition {
                from: current,
                to: current,
            }),
        }
    }

    pub async fn get(&self, id: Uuid) -> Option<Order> {
        let orders = self.orders.read().await;
        orders.iter().find(|o| o.id == id).cloned()
    }

    pub async fn list(&self) -> Vec<Order> {
        self.orders.read().await.clone()
    }

    pub async fn list_by_customer(&self, customer_id: Uuid) -> Vec<Order> {
        let orders = self.orders.read().await;
        orders
            .iter()
            .filter(|o| o.customer_id == customer_id)
            .cloned()
            .collect()
    }

    /// Orders containing at least one of the vendor's items
    pub async fn list_by_vendor(&self, vendor_id: Uuid) -> Vec<Order> {
        let orders = self.orders.read().await;
        orders
            .iter()
            .filter(|o| o.has_vendor(vendor_id))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PricingConfig;
    use crate::order::{OrderItem, OrderTotals};
    use crate::storage::MemoryStorage;
    use chrono::Duration;

    fn stores() -> (Arc<MemoryStorage>, Arc<TransactionStore>, OrderStore) {
        let storage = Arc::new(MemoryStorage::new());
        let ledger = Arc::new(TransactionStore::load(storage.clone()));
        let orders = OrderStore::load(storage.clone(), ledger.clone());
        (storage, ledger, orders)
    }

    fn new_order(customer_id: Uuid, vendor_id: Uuid) -> NewOrder {
        let items = vec![OrderItem {
            product_id: Uuid::new_v4(),
            product_name: "Widget".to_string(),
            quantity: 3,
            price: Decimal::from(20),
            vendor_id,
            vendor: "Acme".to_string(),
        }];
        NewOrder {
            customer_id,
            customer_name: Some("Casey".to_string()),
            items,
            totals: OrderTotals::from_subtotal(Decimal::from(60), &PricingConfig::default()),
            estimated_delivery: Utc::now() + Duration::days(7),
        }
    }

    #[tokio::test]
    async fn test_create_appends_one_purchase() {
        let (_storage, ledger, orders) = stores();
        let customer = Uuid::new_v4();
        let vendor = Uuid::new_v4();

        let order = orders.create(new_order(customer, vendor)).await.unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.total, order.subtotal + order.tax + order.shipping);

        let entries = ledger.list().await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].tx_type, TransactionType::Purchase);
        assert_eq!(entries[0].order_id, Some(order.id));
        assert_eq!(entries[0].amount, order.total);
        assert_eq!(entries[0].initiator_id, Some(customer));
        assert_eq!(entries[0].vendor_ids, vec![vendor]);
    }

    #[tokio::test]
    async fn test_create_rejects_empty_and_inconsistent_orders() {
        let (_storage, ledger, orders) = stores();

        let mut empty = new_order(Uuid::new_v4(), Uuid::new_v4());
        empty.items.clear();
        assert!(matches!(
            orders.create(empty).await,
            Err(OrderError::EmptyOrder)
        ));

        let mut wrong_total = new_order(Uuid::new_v4(), Uuid::new_v4());
        wrong_total.totals.total += Decimal::ONE;
        assert!(matches!(
            orders.create(wrong_total).await,
            Err(OrderError::TotalMismatch { .. })
        ));

        assert!(orders.list().await.is_empty());
        assert!(ledger.is_empty().await);
    }

    #[tokio::test]
    async fn test_status_moves_forward_one_step() {
        let (_storage, _ledger, orders) = stores();
        let order = orders
            .create(new_order(Uuid::new_v4(), Uuid::new_v4()))
            .await
            .unwrap();

        assert!(matches!(
            orders.update_status(order.id, OrderStatus::InTransit).await,
            Err(OrderError::InvalidTransition { .. })
        ));

        let processing = orders
            .update_status(order.id, OrderStatus::Processing)
            .await
            .unwrap();
        assert_eq!(processing.status, OrderStatus::Processing);
        assert!(processing.updated_at.is_some());

        assert!(matches!(
            orders.update_status(order.id, OrderStatus::Pending).await,
            Err(OrderError::InvalidTransition { .. })
        ));

        orders.advance(order.id).await.unwrap();
        let delivered = orders.advance(order.id).await.unwrap();
        assert_eq!(delivered.status, OrderStatus::Delivered);

        assert!(matches!(
            orders.advance(order.id).await,
            Err(OrderError::InvalidTransition { .. })
        ));
    }

    #[tokio::test]
    async fn test_list_by_customer_and_vendor() {
        let (_storage, _ledger, orders) = stores();
        let customer = Uuid::new_v4();
        let vendor = Uuid::new_v4();
        orders.create(new_order(customer, vendor)).await.unwrap();
        orders
            .create(new_order(Uuid::new_v4(), Uuid::new_v4()))
            .await
            .unwrap();

        assert_eq!(orders.list_by_customer(customer).await.len(), 1);
        assert_eq!(orders.list_by_vendor(vendor).await.len(), 1);
        assert_eq!(orders.list().await.len(), 2);
    }

    #[tokio::test]
    async fn test_persist_then_reload() {
        let (storage, ledger, orders) = stores();
        orders
            .create(new_order(Uuid::new_v4(), Uuid::new_v4()))
            .await
            .unwrap();

        let reloaded = OrderStore::load(storage, ledger);
        assert_eq!(reloaded.list().await, orders.list().await);
    }
}
