//! Catalog product entity.

use chrono::{DateTime, Utc};
use common::{Money, ProductId};
use serde::{Deserialize, Serialize};

/// A catalog product.
///
/// The store is the single source of truth for `price` and `stock` at the
/// moment an order is validated. `stock` can never go negative: the Rust
/// type forbids it and the SQL schema carries a matching `CHECK`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Money,
    pub stock: u32,
    /// Inactive products are not orderable and are hidden from listings.
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Creates a new active product with a fresh ID.
    pub fn new(name: impl Into<String>, price: Money, stock: u32) -> Self {
        let now = Utc::now();
        Self {
            id: ProductId::new(),
            name: name.into(),
            description: String::new(),
            price,
            stock,
            active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Sets the description, builder style.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Marks the product inactive, builder style.
    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    /// Returns true if at least one unit is available.
    pub fn in_stock(&self) -> bool {
        self.stock > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_product_is_active() {
        let product = Product::new("Widget", Money::from_cents(1000), 5);
        assert!(product.active);
        assert!(product.in_stock());
        assert_eq!(product.stock, 5);
    }

    #[test]
    fn builder_helpers() {
        let product = Product::new("Widget", Money::from_cents(1000), 0)
            .with_description("A fine widget")
            .inactive();
        assert!(!product.active);
        assert!(!product.in_stock());
        assert_eq!(product.description, "A fine widget");
    }
}
