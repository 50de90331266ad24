//! Product store - catalog records owned by suppliers and vendors

use chrono::Utc;
use rust_decimal::Decimal;
use std::collections::BTreeSet;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;
use validator::Validate;

use crate::product::{NewProduct, Product, ProductPatch, ProductQuery, StockLine};
use crate::storage::{keys, load_json, sample_id, save_json, Storage, StorageError};

/// Product store errors
#[derive(Error, Debug)]
pub enum ProductError {
    #[error("Invalid product: {0}")]
    Validation(String),

    #[error("Product not found: {0}")]
    NotFound(Uuid),

    #[error("Insufficient stock for {name}: {available} available, {requested} requested")]
    InsufficientStock {
        name: String,
        available: u32,
        requested: u32,
    },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<validator::ValidationErrors> for ProductError {
    fn from(err: validator::ValidationErrors) -> Self {
        ProductError::Validation(err.to_string())
    }
}

/// Product catalog backed by `supply_chain_products`
pub struct ProductStore {
    storage: Arc<dyn Storage>,
    products: RwLock<Vec<Product>>,
}

impl ProductStore {
    /// Load the catalog, seeding the sample products on first start
    pub fn load(storage: Arc<dyn Storage>) -> Result<Self, ProductError> {
        let products = match load_json::<Vec<Product>>(storage.as_ref(), keys::PRODUCTS) {
            Some(products) => products,
            None if matches!(storage.get_item(keys::PRODUCTS), Ok(None)) => {
                let products = sample_catalog();
                save_json(storage.as_ref(), keys::PRODUCTS, &products)?;
                tracing::info!(count = products.len(), "Seeded sample catalog");
                products
            }
            None => Vec::new(),
        };

        tracing::info!(count = products.len(), "Loaded products");
        Ok(Self {
            storage,
            products: RwLock::new(products),
        })
    }

    fn persist(&self, products: &[Product]) -> Result<(), ProductError> {
        save_json(self.storage.as_ref(), keys::PRODUCTS, products)?;
        Ok(())
    }

    /// Add a product owned by `owner_id`
    pub async fn add(
        &self,
        owner_id: Uuid,
        owner_name: &str,
        data: NewProduct,
    ) -> Result<Product, ProductError> {
        let data = data.trimmed();
        data.validate()?;

        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4(),
            name: data.name,
            description: data.description,
            price: data.price,
            quantity: data.quantity,
            category: data.category,
            supplier_id: owner_id,
            supplier: owner_name.to_string(),
            image: data.image,
            created_at: now,
            updated_at: now,
        };

        let mut products = self.products.write().await;
        products.push(product.clone());
        if let Err(e) = self.persist(&products) {
            products.pop();
            return Err(e);
        }

        tracing::info!(product_id = %product.id, owner = %owner_id, "Product added");
        Ok(product)
    }

    /// Merge the present patch fields into a product
    pub async fn update(&self, id: Uuid, patch: ProductPatch) -> Result<Product, ProductError> {
        let patch = patch.trimmed();
        patch.validate()?;

        let mut products = self.products.write().await;
        let index = products
            .iter()
            .position(|p| p.id == id)
            .ok_or(ProductError::NotFound(id))?;

        let previous = products[index].clone();
        patch.apply(&mut products[index]);
        products[index].updated_at = Utc::now();

        if let Err(e) = self.persist(&products) {
            products[index] = previous;
            return Err(e);
        }

        tracing::info!(product_id = %id, "Product updated");
        Ok(products[index].clone())
    }

    pub async fn delete(&self, id: Uuid) -> Result<Product, ProductError> {
        let mut products = self.products.write().await;
        let index = products
            .iter()
            .position(|p| p.id == id)
            .ok_or(ProductError::NotFound(id))?;

        let removed = products.remove(index);
        if let Err(e) = self.persist(&products) {
            products.insert(index, removed);
            return Err(e);
        }

        tracing::info!(product_id = %id, "Product deleted");
        Ok(removed)
    }

    pub async fn get(&self, id: Uuid) -> Option<Product> {
        let products = self.products.read().await;
        products.iter().find(|p| p.id == id).cloned()
    }

    pub async fn list(&self) -> Vec<Product> {
        self.products.read().await.clone()
    }

    pub async fn list_by_owner(&self, owner_id: Uuid) -> Vec<Product> {
        let products = self.products.read().await;
        products
            .iter()
            .filter(|p| p.supplier_id == owner_id)
            .cloned()
            .collect()
    }

    /// Filter and sort the catalog for browsing
    pub async fn search(&self, query: &ProductQuery) -> Vec<Product> {
        let mut matches: Vec<Product> = {
            let products = self.products.read().await;
            products
                .iter()
                .filter(|p| query.matches(p))
                .cloned()
                .collect()
        };
        query.sort(&mut matches);
        matches
    }

    /// Distinct categories, sorted
    pub async fn categories(&self) -> Vec<String> {
        let products = self.products.read().await;
        products
            .iter()
            .map(|p| p.category.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Decrement stock for every line, or for none of them
    pub async fn reserve_stock(&self, lines: &[StockLine]) -> Result<(), ProductError> {
        let mut products = self.products.write().await;

        for line in lines {
            let requested: u32 = lines
                .iter()
                .filter(|l| l.product_id == line.product_id)
                .map(|l| l.quantity)
                .sum();
            let product = products
                .iter()
                .find(|p| p.id == line.product_id)
                .ok_or(ProductError::NotFound(line.product_id))?;

            if product.quantity < requested {
                return Err(ProductError::InsufficientStock {
                    name: product.name.clone(),
                    available: product.quantity,
                    requested,
                });
            }
        }

        let previous = products.clone();
        let now = Utc::now();
        for line in lines {
            if let Some(product) = products.iter_mut().find(|p| p.id == line.product_id) {
                product.quantity -= line.quantity;
                product.updated_at = now;
            }
        }

        if let Err(e) = self.persist(&products) {
            *products = previous;
            return Err(e);
        }

        tracing::debug!(lines = lines.len(), "Stock reserved");
        Ok(())
    }

    /// Return previously reserved stock; lines for deleted products are skipped
    pub async fn release_stock(&self, lines: &[StockLine]) -> Result<(), ProductError> {
        let mut products = self.products.write().await;
        let now = Utc::now();
        for line in lines {
            if let Some(product) = products.iter_mut().find(|p| p.id == line.product_id) {
                product.quantity = product.quantity.saturating_add(line.quantity);
                product.updated_at = now;
            }
        }

        self.persist(&products)?;
        tracing::debug!(lines = lines.len(), "Stock released");
        Ok(())
    }
}

/// name, description, price, quantity, category, supplier, owner
const SAMPLE_CATALOG: [(&str, &str, i64, u32, &str, &str, u128); 3] = [
    (
        "Smartphone X1",
        "Latest smartphone with advanced features",
        299,
        50,
        "Electronics",
        "TechSupplier Inc",
        1,
    ),
    (
        "Cotton T-Shirt",
        "Premium quality cotton t-shirt",
        29,
        100,
        "Textiles",
        "Fashion Hub",
        1,
    ),
    (
        "Organic Coffee Beans",
        "Premium organic coffee beans",
        15,
        200,
        "Food & Beverages",
        "Coffee Co",
        2,
    ),
];

fn sample_catalog() -> Vec<Product> {
    let now = Utc::now();
    SAMPLE_CATALOG
        .iter()
        .map(
            |&(name, description, price, quantity, category, supplier, owner)| Product {
                id: Uuid::new_v4(),
                name: name.to_string(),
                description: description.to_string(),
                price: Decimal::from(price),
                quantity,
                category: category.to_string(),
                supplier_id: sample_id(owner),
                supplier: supplier.to_string(),
                image: None,
                created_at: now,
                updated_at: now,
            },
        )
        .collect()
}
