//! Checkout flow across the cart, product, order, wallet and ledger stores

mod common;

use rust_decimal::Decimal;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use common::{memory_state, test_config, vendor_product};
use supplychain_server::cart::{CheckoutError, MARKETPLACE_ADDRESS};
use supplychain_server::ledger::{TransactionStatus, TransactionType};
use supplychain_server::order::{OrderError, OrderStatus};
use supplychain_server::state::AppState;
use supplychain_server::storage::{keys, MemoryStorage, Storage, StorageError};
use supplychain_server::wallet::SendRequest;

#[tokio::test]
async fn test_checkout_rejected_when_balance_is_short() {
    let state = memory_state(&test_config(50));
    let customer = Uuid::new_v4();
    let product = vendor_product(&state, Uuid::new_v4(), 60, 5).await;

    state
        .wallet_service
        .create_new_wallet(customer, Some("Alice".to_string()))
        .await
        .unwrap();
    state.cart_store.add_item(customer, product.id).await.unwrap();
    let ledger_before = state.ledger.len().await;

    let err = state
        .checkout_service
        .checkout(customer, Some("Alice".to_string()))
        .await
        .unwrap_err();

    match err {
        CheckoutError::InsufficientBalance { balance, total } => {
            assert_eq!(balance, Decimal::from(50));
            // 60 + 4.80 tax + 10 shipping
            assert_eq!(total, Decimal::new(7480, 2));
        }
        other => panic!("unexpected error: {other}"),
    }

    assert_eq!(state.cart_store.items(customer).await.len(), 1);
    assert_eq!(
        state.wallet_service.balance(customer).await.unwrap(),
        Decimal::from(50)
    );
    assert_eq!(state.product_store.get(product.id).await.unwrap().quantity, 5);
    assert!(state.order_store.list_by_customer(customer).await.is_empty());
    assert_eq!(state.ledger.len().await, ledger_before);
}

#[tokio::test]
async fn test_checkout_without_wallet_is_rejected() {
    let state = memory_state(&test_config(5000));
    let customer = Uuid::new_v4();
    let product = vendor_product(&state, Uuid::new_v4(), 10, 1).await;
    state.cart_store.add_item(customer, product.id).await.unwrap();

    let err = state
        .checkout_service
        .checkout(customer, None)
        .await
        .unwrap_err();
    assert!(matches!(err, CheckoutError::Wallet(_)));
    assert_eq!(state.cart_store.items(customer).await.len(), 1);
}

#[tokio::test]
async fn test_empty_cart_cannot_check_out() {
    let state = memory_state(&test_config(5000));
    let customer = Uuid::new_v4();
    state
        .wallet_service
        .create_new_wallet(customer, None)
        .await
        .unwrap();

    let err = state
        .checkout_service
        .checkout(customer, None)
        .await
        .unwrap_err();
    assert!(matches!(err, CheckoutError::EmptyCart));
}

#[tokio::test]
async fn test_checkout_creates_order_and_payment() {
    let state = memory_state(&test_config(5000));
    let customer = Uuid::new_v4();
    let product = vendor_product(&state, Uuid::new_v4(), 20, 5).await;

    state
        .wallet_service
        .create_new_wallet(customer, Some("Alice".to_string()))
        .await
        .unwrap();
    state.cart_store.add_item(customer, product.id).await.unwrap();
    state
        .cart_store
        .set_quantity(customer, product.id, 2)
        .await
        .unwrap();

    let receipt = state
        .checkout_service
        .checkout(customer, Some("Alice".to_string()))
        .await
        .unwrap();

    let order = &receipt.order;
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.subtotal, Decimal::from(40));
    assert_eq!(order.tax, Decimal::new(320, 2));
    assert_eq!(order.shipping, Decimal::from(10));
    assert_eq!(order.total, order.subtotal + order.tax + order.shipping);

    // The purchase is the only entry that references the order
    let entries = state.ledger.list().await;
    let for_order: Vec<_> = entries
        .iter()
        .filter(|t| t.order_id == Some(order.id))
        .collect();
    assert_eq!(for_order.len(), 1);
    assert_eq!(for_order[0].tx_type, TransactionType::Purchase);
    assert_eq!(for_order[0].amount, order.total);

    let payment = receipt.payment.as_ref().unwrap();
    assert_eq!(payment.tx_type, TransactionType::Send);
    assert_eq!(payment.status, TransactionStatus::Pending);
    assert_eq!(payment.amount, order.total);
    assert_eq!(payment.order_id, None);
    assert_eq!(payment.to.as_deref(), Some(MARKETPLACE_ADDRESS));
    assert_eq!(entries.len(), 2);

    assert_eq!(
        state.wallet_service.balance(customer).await.unwrap(),
        Decimal::from(5000) - order.total
    );
    assert_eq!(state.product_store.get(product.id).await.unwrap().quantity, 3);
    assert!(state.cart_store.items(customer).await.is_empty());
    assert!(state.ledger.verify_chain().await.valid);
}

#[tokio::test(start_paused = true)]
async fn test_vendor_wallet_receives_payment_after_confirmation() {
    let state = memory_state(&test_config(5000));
    let customer = Uuid::new_v4();
    let vendor = Uuid::new_v4();
    let product = vendor_product(&state, vendor, 150, 2).await;

    let vendor_wallet = state
        .wallet_service
        .create_new_wallet(vendor, Some("Test Vendor".to_string()))
        .await
        .unwrap();
    state
        .wallet_service
        .create_new_wallet(customer, None)
        .await
        .unwrap();
    state.cart_store.add_item(customer, product.id).await.unwrap();

    let receipt = state
        .checkout_service
        .checkout(customer, None)
        .await
        .unwrap();
    // Above the free shipping threshold
    assert_eq!(receipt.order.shipping, Decimal::ZERO);
    let payment = receipt.payment.as_ref().unwrap();
    assert_eq!(payment.to.as_deref(), Some(vendor_wallet.address.as_str()));

    tokio::time::sleep(Duration::from_millis(2100)).await;

    let payment = state.ledger.get(payment.id).await.unwrap();
    assert_eq!(payment.status, TransactionStatus::Confirmed);
    assert_eq!(
        state.wallet_service.balance(vendor).await.unwrap(),
        Decimal::from(5000) + receipt.order.total
    );

    let vendor_history = state.ledger.list_by_user(vendor).await;
    assert!(vendor_history.iter().any(|t| t.tx_type == TransactionType::Receive
        && t.to.as_deref() == Some(vendor_wallet.address.as_str())
        && t.amount == receipt.order.total));
    assert_eq!(
        state
            .ledger
            .list()
            .await
            .iter()
            .filter(|t| t.order_id == Some(receipt.order.id))
            .count(),
        1
    );
}

#[tokio::test]
async fn test_free_cart_checks_out_without_payment() {
    let state = memory_state(&test_config(5000));
    let customer = Uuid::new_v4();
    let product = vendor_product(&state, Uuid::new_v4(), 0, 5).await;
    state
        .wallet_service
        .create_new_wallet(customer, None)
        .await
        .unwrap();
    state.cart_store.add_item(customer, product.id).await.unwrap();

    let receipt = state
        .checkout_service
        .checkout(customer, None)
        .await
        .unwrap();

    assert_eq!(receipt.order.total, Decimal::ZERO);
    assert!(receipt.payment.is_none());
    assert_eq!(state.order_store.list_by_customer(customer).await.len(), 1);

    let entries = state.ledger.list().await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].tx_type, TransactionType::Purchase);
    assert_eq!(entries[0].order_id, Some(receipt.order.id));

    assert!(state.cart_store.items(customer).await.is_empty());
    assert_eq!(state.product_store.get(product.id).await.unwrap().quantity, 4);
    assert_eq!(
        state.wallet_service.balance(customer).await.unwrap(),
        Decimal::from(5000)
    );
}

#[tokio::test]
async fn test_failed_payment_leaves_no_order() {
    let state = memory_state(&test_config(100));
    let customer = Uuid::new_v4();
    let product = vendor_product(&state, Uuid::new_v4(), 20, 5).await;
    state
        .wallet_service
        .create_new_wallet(customer, None)
        .await
        .unwrap();
    state.cart_store.add_item(customer, product.id).await.unwrap();

    // Balance drained through the wallet after the cart was filled
    state
        .wallet_service
        .send_transaction(
            customer,
            SendRequest {
                to: MARKETPLACE_ADDRESS.to_string(),
                amount: Decimal::from(90),
                product_id: None,
                order_id: None,
            },
        )
        .await
        .unwrap();

    let err = state
        .checkout_service
        .checkout(customer, None)
        .await
        .unwrap_err();
    assert!(matches!(err, CheckoutError::InsufficientBalance { .. }));

    assert!(state.order_store.list_by_customer(customer).await.is_empty());
    assert_eq!(state.ledger.len().await, 1);
    assert_eq!(state.cart_store.items(customer).await.len(), 1);
    assert_eq!(state.product_store.get(product.id).await.unwrap().quantity, 5);
    assert_eq!(
        state.wallet_service.balance(customer).await.unwrap(),
        Decimal::from(10)
    );
}

#[tokio::test]
async fn test_order_failure_after_payment_refunds_customer() {
    let storage = Arc::new(FlakyOrders::default());
    let state = AppState::new(storage.clone(), &test_config(5000)).unwrap();
    let customer = Uuid::new_v4();
    let product = vendor_product(&state, Uuid::new_v4(), 20, 5).await;
    state
        .wallet_service
        .create_new_wallet(customer, None)
        .await
        .unwrap();
    state.cart_store.add_item(customer, product.id).await.unwrap();

    storage.fail_orders.store(true, Ordering::SeqCst);
    let err = state
        .checkout_service
        .checkout(customer, None)
        .await
        .unwrap_err();
    assert!(matches!(err, CheckoutError::Order(OrderError::Storage(_))));

    assert!(state.order_store.list().await.is_empty());
    assert_eq!(
        state.wallet_service.balance(customer).await.unwrap(),
        Decimal::from(5000)
    );
    let entries = state.ledger.list().await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].tx_type, TransactionType::Send);
    assert_eq!(entries[0].status, TransactionStatus::Failed);
    assert_eq!(state.cart_store.items(customer).await.len(), 1);
    assert_eq!(state.product_store.get(product.id).await.unwrap().quantity, 5);
}

/// Memory storage whose order collection can be made unwritable
#[derive(Default)]
struct FlakyOrders {
    inner: MemoryStorage,
    fail_orders: AtomicBool,
}

impl Storage for FlakyOrders {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.inner.get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if key == keys::ORDERS && self.fail_orders.load(Ordering::SeqCst) {
            return Err(std::io::Error::other("orders volume is read-only").into());
        }
        self.inner.set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.inner.remove_item(key)
    }
}

#[tokio::test]
async fn test_order_moves_forward_one_step() {
    let state = memory_state(&test_config(5000));
    let customer = Uuid::new_v4();
    let product = vendor_product(&state, Uuid::new_v4(), 20, 5).await;
    state
        .wallet_service
        .create_new_wallet(customer, None)
        .await
        .unwrap();
    state.cart_store.add_item(customer, product.id).await.unwrap();
    let order = state
        .checkout_service
        .checkout(customer, None)
        .await
        .unwrap()
        .order;

    let err = state
        .order_store
        .update_status(order.id, OrderStatus::Delivered)
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::InvalidTransition { .. }));

    let order = state.order_store.advance(order.id).await.unwrap();
    assert_eq!(order.status, OrderStatus::Processing);
    let order = state
        .order_store
        .update_status(order.id, OrderStatus::InTransit)
        .await
        .unwrap();
    assert_eq!(order.status, OrderStatus::InTransit);
}
