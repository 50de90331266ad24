//! Checkout - turns a cart into a paid order

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::cart::{CartError, CartItem, CartStore};
use crate::ledger::Transaction;
use crate::order::{NewOrder, Order, OrderError, OrderItem, OrderStore, OrderTotals};
use crate::product::{ProductError, ProductStore, StockLine};
use crate::wallet::{SendRequest, WalletError, WalletService};

/// Payee for orders whose vendor has no registered wallet
pub const MARKETPLACE_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

/// Checkout errors
#[derive(Error, Debug)]
pub enum CheckoutError {
    #[error("Cart is empty")]
    EmptyCart,

    #[error("Insufficient wallet balance: {balance} available, {total} required")]
    InsufficientBalance { balance: Decimal, total: Decimal },

    #[error(transparent)]
    Cart(#[from] CartError),

    #[error(transparent)]
    Product(#[from] ProductError),

    #[error(transparent)]
    Order(#[from] OrderError),

    #[error(transparent)]
    Wallet(#[from] WalletError),
}

/// Result of a successful checkout
#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutReceipt {
    pub order: Order,
    /// `None` when the order total is zero
    pub payment: Option<Transaction>,
}

/// Serializes checkouts across all customers
pub struct CheckoutService {
    carts: Arc<CartStore>,
    products: Arc<ProductStore>,
    orders: Arc<OrderStore>,
    wallets: Arc<WalletService>,
    lock: Mutex<()>,
}

impl CheckoutService {
    pub fn new(
        carts: Arc<CartStore>,
        products: Arc<ProductStore>,
        orders: Arc<OrderStore>,
        wallets: Arc<WalletService>,
    ) -> Self {
        Self {
            carts,
            products,
            orders,
            wallets,
            lock: Mutex::new(()),
        }
    }

    /// Reserve stock, pay, create the order and empty the cart
    ///
    /// The payment is taken before the order exists, so a failed payment
    /// leaves no order behind. An order that cannot be created after a
    /// successful payment has its transfer cancelled and refunded.
    pub async fn checkout(
        &self,
        customer_id: Uuid,
        customer_name: Option<String>,
    ) -> Result<CheckoutReceipt, CheckoutError> {
        let _guard = self.lock.lock().await;

        let summary = self.carts.summary(customer_id).await;
        if summary.items.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        self.wallets.wallet(customer_id).await?;

        let totals: OrderTotals = summary.totals;
        let lines: Vec<StockLine> = summary.items.iter().map(CartItem::stock_line).collect();
        self.products.reserve_stock(&lines).await?;

        let payment = if totals.total.is_zero() {
            None
        } else {
            match self.pay(customer_id, &summary.items, totals.total).await {
                Ok(tx) => Some(tx),
                Err(e) => {
                    self.release(&lines).await;
                    return Err(e);
                }
            }
        };

        let new_order = NewOrder {
            customer_id,
            customer_name,
            items: summary.items.iter().map(order_item).collect(),
            totals,
            estimated_delivery: Utc::now()
                + Duration::days(self.carts.pricing().delivery_days),
        };

        let order = match self.orders.create(new_order).await {
            Ok(order) => order,
            Err(e) => {
                tracing::error!(customer = %customer_id, error = %e, "Order creation failed after payment");
                if let Some(tx) = &payment {
                    if let Err(refund_err) = self.wallets.cancel_transfer(customer_id, tx.id).await {
                        tracing::error!(tx_id = %tx.id, error = %refund_err, "Failed to refund payment");
                    }
                }
                self.release(&lines).await;
                return Err(e.into());
            }
        };

        self.carts.clear(customer_id).await?;

        tracing::info!(
            order_id = %order.id,
            customer = %customer_id,
            total = %order.total,
            payment = ?payment.as_ref().map(|tx| tx.id),
            "Checkout completed"
        );

        Ok(CheckoutReceipt { order, payment })
    }

    /// Send `total` to the first line's vendor, or the marketplace
    async fn pay(
        &self,
        customer_id: Uuid,
        items: &[CartItem],
        total: Decimal,
    ) -> Result<Transaction, CheckoutError> {
        let payee = match items.first() {
            Some(item) => self.wallets.address_of(item.supplier_id).await,
            None => None,
        }
        .unwrap_or_else(|| MARKETPLACE_ADDRESS.to_string());

        let request = SendRequest {
            to: payee,
            amount: total,
            product_id: None,
            order_id: None,
        };
        self.wallets
            .send_transaction(customer_id, request)
            .await
            .map_err(|e| match e {
                WalletError::InsufficientBalance { balance, amount } => {
                    tracing::info!(
                        customer = %customer_id,
                        balance = %balance,
                        total = %amount,
                        "Checkout rejected: insufficient balance"
                    );
                    CheckoutError::InsufficientBalance {
                        balance,
                        total: amount,
                    }
                }
                other => other.into(),
            })
    }

    async fn release(&self, lines: &[StockLine]) {
        if let Err(e) = self.products.release_stock(lines).await {
            tracing::error!(error = %e, "Failed to release reserved stock");
        }
    }
}

fn order_item(item: &CartItem) -> OrderItem {
    OrderItem {
        product_id: item.id,
        product_name: item.name.clone(),
        quantity: item.quantity,
        price: item.price,
        vendor_id: item.supplier_id,
        vendor: item.supplier.clone(),
    }
}
