//! Cart store - per-customer carts limited by live stock

use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::cart::{CartItem, CartSummary};
use crate::config::PricingConfig;
use crate::order::OrderTotals;
use crate::product::ProductStore;
use crate::storage::{keys, load_or_default, save_json, Storage, StorageError};

/// Cart errors
#[derive(Error, Debug)]
pub enum CartError {
    #[error("Product not found: {0}")]
    ProductNotFound(Uuid),

    #[error("{0} is out of stock")]
    OutOfStock(String),

    #[error("Only {available} of {name} in stock, {requested} requested")]
    StockLimitExceeded {
        name: String,
        available: u32,
        requested: u32,
    },

    #[error("Product {0} is not in the cart")]
    ItemNotInCart(Uuid),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Carts persisted per customer at `cart_<userId>`
pub struct CartStore {
    storage: Arc<dyn Storage>,
    products: Arc<ProductStore>,
    pricing: PricingConfig,
    carts: RwLock<HashMap<Uuid, Vec<CartItem>>>,
}

impl CartStore {
    pub fn new(storage: Arc<dyn Storage>, products: Arc<ProductStore>, pricing: PricingConfig) -> Self {
        Self {
            storage,
            products,
            pricing,
            carts: RwLock::new(HashMap::new()),
        }
    }

    pub fn pricing(&self) -> &PricingConfig {
        &self.pricing
    }

    fn cart_mut<'a>(
        &self,
        carts: &'a mut HashMap<Uuid, Vec<CartItem>>,
        user_id: Uuid,
    ) -> &'a mut Vec<CartItem> {
        carts
            .entry(user_id)
            .or_insert_with(|| load_or_default(self.storage.as_ref(), &keys::cart(user_id)))
    }

    /// Persist `items`, restoring `previous` in memory on failure
    fn commit(
        &self,
        user_id: Uuid,
        cart: &mut Vec<CartItem>,
        previous: Vec<CartItem>,
    ) -> Result<Vec<CartItem>, CartError> {
        if let Err(e) = save_json(self.storage.as_ref(), &keys::cart(user_id), cart) {
            *cart = previous;
            return Err(e.into());
        }
        Ok(cart.clone())
    }

    /// Add one unit of a product
    pub async fn add_item(&self, user_id: Uuid, product_id: Uuid) -> Result<Vec<CartItem>, CartError> {
        let product = self
            .products
            .get(product_id)
            .await
            .ok_or(CartError::ProductNotFound(product_id))?;
        if !product.in_stock() {
            return Err(CartError::OutOfStock(product.name));
        }

        let mut carts = self.carts.write().await;
        let cart = self.cart_mut(&mut carts, user_id);
        let previous = cart.clone();

        match cart.iter_mut().find(|item| item.id == product_id) {
            Some(item) => {
                let requested = item.quantity + 1;
                if requested > product.quantity {
                    return Err(CartError::StockLimitExceeded {
                        name: product.name,
                        available: product.quantity,
                        requested,
                    });
                }
                item.quantity = requested;
            }
            None => cart.push(CartItem::from_product(&product, 1)),
        }

        let items = self.commit(user_id, cart, previous)?;
        tracing::debug!(user = %user_id, product_id = %product_id, "Added to cart");
        Ok(items)
    }

    /// Set a line's quantity; zero removes the line
    pub async fn set_quantity(
        &self,
        user_id: Uuid,
        product_id: Uuid,
        quantity: u32,
    ) -> Result<Vec<CartItem>, CartError> {
        if quantity == 0 {
            return self.remove_item(user_id, product_id).await;
        }

        let product = self
            .products
            .get(product_id)
            .await
            .ok_or(CartError::ProductNotFound(product_id))?;
        if quantity > product.quantity {
            return Err(CartError::StockLimitExceeded {
                name: product.name,
                available: product.quantity,
                requested: quantity,
            });
        }

        let mut carts = self.carts.write().await;
        let cart = self.cart_mut(&mut carts, user_id);
        let previous = cart.clone();

        let item = cart
            .iter_mut()
            .find(|item| item.id == product_id)
            .ok_or(CartError::ItemNotInCart(product_id))?;
        item.quantity = quantity;

        self.commit(user_id, cart, previous)
    }

    /// Remove a line; removing an absent line is a no-op
    pub async fn remove_item(&self, user_id: Uuid, product_id: Uuid) -> Result<Vec<CartItem>, CartError> {
        let mut carts = self.carts.write().await;
        let cart = self.cart_mut(&mut carts, user_id);
        let previous = cart.clone();

        cart.retain(|item| item.id != product_id);
        self.commit(user_id, cart, previous)
    }

    pub async fn clear(&self, user_id: Uuid) -> Result<(), CartError> {
        let mut carts = self.carts.write().await;
        let cart = self.cart_mut(&mut carts, user_id);
        let previous = std::mem::take(cart);

        self.commit(user_id, cart, previous)?;
        tracing::debug!(user = %user_id, "Cart cleared");
        Ok(())
    }

    pub async fn items(&self, user_id: Uuid) -> Vec<CartItem> {
        let mut carts = self.carts.write().await;
        self.cart_mut(&mut carts, user_id).clone()
    }

    /// Cart contents with subtotal, tax, shipping and total
    pub async fn summary(&self, user_id: Uuid) -> CartSummary {
        let items = self.items(user_id).await;
        let subtotal: Decimal = items.iter().map(CartItem::line_total).sum();

        CartSummary {
            item_count: items
                .iter()
                .fold(0u32, |count, item| count.saturating_add(item.quantity)),
            totals: OrderTotals::from_subtotal(subtotal, &self.pricing),
            items,
        }
    }
}
