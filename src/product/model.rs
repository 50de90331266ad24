//! Product models and catalog queries

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::MAX_UNIT_PRICE;

/// Catalog product owned by a supplier or vendor
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    pub quantity: u32,
    pub category: String,
    pub supplier_id: Uuid,
    /// Display name of the owner at creation time
    pub supplier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn stock_level(&self) -> StockLevel {
        StockLevel::from_quantity(self.quantity)
    }

    pub fn in_stock(&self) -> bool {
        self.quantity > 0
    }
}

/// Request DTO for adding a product
#[derive(Debug, Deserialize, Validate, Clone)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    #[validate(length(min = 1, message = "Product name is required"))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[validate(custom = "validate_price")]
    pub price: Decimal,
    #[serde(default)]
    pub quantity: u32,
    #[validate(length(min = 1, message = "Category is required"))]
    pub category: String,
    #[serde(default)]
    pub image: Option<String>,
}

/// Partial update; absent fields are left untouched
#[derive(Debug, Deserialize, Validate, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProductPatch {
    #[validate(length(min = 1, message = "Product name cannot be empty"))]
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate(custom = "validate_price")]
    pub price: Option<Decimal>,
    pub quantity: Option<u32>,
    #[validate(length(min = 1, message = "Category cannot be empty"))]
    pub category: Option<String>,
    pub image: Option<String>,
}

impl NewProduct {
    /// Trim the identifying text fields so blank values fail validation
    pub(crate) fn trimmed(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self.category = self.category.trim().to_string();
        self
    }
}

impl ProductPatch {
    pub(crate) fn trimmed(mut self) -> Self {
        self.name = self.name.map(|name| name.trim().to_string());
        self.category = self.category.map(|category| category.trim().to_string());
        self
    }

    pub(crate) fn apply(self, product: &mut Product) {
        if let Some(name) = self.name {
            product.name = name;
        }
        if let Some(description) = self.description {
            product.description = description;
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if let Some(quantity) = self.quantity {
            product.quantity = quantity;
        }
        if let Some(category) = self.category {
            product.category = category;
        }
        if let Some(image) = self.image {
            product.image = Some(image);
        }
    }
}

fn validate_price(price: &Decimal) -> Result<(), ValidationError> {
    if price.is_sign_negative() && !price.is_zero() {
        let mut err = ValidationError::new("negative_price");
        err.message = Some("Price must not be negative".into());
        return Err(err);
    }
    if *price > MAX_UNIT_PRICE {
        let mut err = ValidationError::new("price_too_high");
        err.message = Some(format!("Price must not exceed {}", MAX_UNIT_PRICE).into());
        return Err(err);
    }
    Ok(())
}

/// Catalog ordering
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ProductSort {
    #[default]
    Name,
    PriceLow,
    PriceHigh,
    Newest,
}

/// Browse filters
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProductQuery {
    /// Case-insensitive match on name, description or category
    pub search: Option<String>,
    pub category: Option<String>,
    pub sort: Option<ProductSort>,
    #[serde(default)]
    pub in_stock_only: bool,
}

impl ProductQuery {
    pub(crate) fn matches(&self, product: &Product) -> bool {
        if self.in_stock_only && !product.in_stock() {
            return false;
        }

        if let Some(category) = self.category.as_deref().filter(|c| !c.is_empty()) {
            if !product.category.eq_ignore_ascii_case(category) {
                return false;
            }
        }

        match self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(term) => {
                let term = term.to_lowercase();
                product.name.to_lowercase().contains(&term)
                    || product.description.to_lowercase().contains(&term)
                    || product.category.to_lowercase().contains(&term)
            }
            None => true,
        }
    }

    pub(crate) fn sort(&self, products: &mut [Product]) {
        match self.sort.unwrap_or_default() {
            ProductSort::Name => products.sort_by(|a, b| a.name.cmp(&b.name)),
            ProductSort::PriceLow => products.sort_by(|a, b| a.price.cmp(&b.price)),
            ProductSort::PriceHigh => products.sort_by(|a, b| b.price.cmp(&a.price)),
            ProductSort::Newest => products.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        }
    }
}

/// Stock classification shown in inventory views
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StockLevel {
    OutOfStock,
    Low,
    Medium,
    InStock,
}

impl StockLevel {
    pub fn from_quantity(quantity: u32) -> Self {
        match quantity {
            0 => StockLevel::OutOfStock,
            1..=9 => StockLevel::Low,
            10..=49 => StockLevel::Medium,
            _ => StockLevel::InStock,
        }
    }
}

/// One line of a stock reservation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockLine {
    pub product_id: Uuid,
    pub quantity: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(name: &str, price: i64, quantity: u32, category: &str) -> Product {
        Product {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: format!("{} description", name),
            price: Decimal::from(price),
            quantity,
            category: category.to_string(),
            supplier_id: Uuid::new_v4(),
            supplier: "Acme".to_string(),
            image: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_stock_levels() {
        assert_eq!(StockLevel::from_quantity(0), StockLevel::OutOfStock);
        assert_eq!(StockLevel::from_quantity(9), StockLevel::Low);
        assert_eq!(StockLevel::from_quantity(10), StockLevel::Medium);
        assert_eq!(StockLevel::from_quantity(49), StockLevel::Medium);
        assert_eq!(StockLevel::from_quantity(50), StockLevel::InStock);
    }

    #[test]
    fn test_new_product_validation() {
        let valid = NewProduct {
            name: "Widget".to_string(),
            description: String::new(),
            price: Decimal::ZERO,
            quantity: 1,
            category: "Tools".to_string(),
            image: None,
        };
        assert!(valid.validate().is_ok());

        let mut missing_name = valid.clone();
        missing_name.name = String::new();
        assert!(missing_name.validate().is_err());

        let mut negative = valid.clone();
        negative.price = Decimal::from(-1);
        assert!(negative.validate().is_err());

        let mut at_ceiling = valid.clone();
        at_ceiling.price = MAX_UNIT_PRICE;
        assert!(at_ceiling.validate().is_ok());

        let mut too_high = valid.clone();
        too_high.price = Decimal::MAX;
        assert!(too_high.validate().is_err());

        let mut blank = valid;
        blank.name = "   ".to_string();
        blank.category = "\t".to_string();
        let errors = blank.trimmed().validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("name"));
        assert!(fields.contains_key("category"));
    }

    #[test]
    fn test_query_matches_search_and_category() {
        let phone = product("Smartphone", 299, 5, "Electronics");
        let query = ProductQuery {
            search: Some("SMART".to_string()),
            ..Default::default()
        };
        assert!(query.matches(&phone));

        let query = ProductQuery {
            search: Some("electro".to_string()),
            category: Some("textiles".to_string()),
            ..Default::default()
        };
        assert!(!query.matches(&phone));

        let empty = product("Empty", 1, 0, "Electronics");
        let query = ProductQuery {
            in_stock_only: true,
            ..Default::default()
        };
        assert!(!query.matches(&empty));
    }

    #[test]
    fn test_query_sorting() {
        let mut products = vec![
            product("B", 20, 1, "x"),
            product("A", 30, 1, "x"),
            product("C", 10, 1, "x"),
        ];

        let mut query = ProductQuery::default();
        query.sort(&mut products);
        assert_eq!(products[0].name, "A");

        query.sort = Some(ProductSort::PriceLow);
        query.sort(&mut products);
        assert_eq!(products[0].name, "C");

        query.sort = Some(ProductSort::PriceHigh);
        query.sort(&mut products);
        assert_eq!(products[0].name, "A");
    }

    #[test]
    fn test_patch_only_touches_present_fields() {
        let mut p = product("Widget", 5, 3, "Tools");
        ProductPatch {
            price: Some(Decimal::from(7)),
            ..Default::default()
        }
        .apply(&mut p);

        assert_eq!(p.price, Decimal::from(7));
        assert_eq!(p.name, "Widget");
        assert_eq!(p.quantity, 3);
    }
}
