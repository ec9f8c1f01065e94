use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use common::{OrderId, ProductId, UserId};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    NewOrder, Order, OrderItem, OrderStatus, Product, Result, StoreError, store::ShopStore,
};

#[derive(Default)]
struct Inner {
    products: HashMap<ProductId, Product>,
    orders: HashMap<OrderId, Order>,
    order_numbers: HashSet<String>,
    // Per-user favorites in insertion order; newest-first on read.
    favorites: HashMap<UserId, Vec<ProductId>>,
}

/// In-memory shop store for testing and local development.
///
/// All mutations take the single write lock, so every compound operation
/// is atomic and concurrent commits against the same product serialize —
/// the same guarantee the PostgreSQL implementation gets from
/// transactions.
#[derive(Clone, Default)]
pub struct InMemoryShopStore {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryShopStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of persisted orders.
    pub async fn order_count(&self) -> usize {
        self.inner.read().await.orders.len()
    }

    /// Returns a product's current stock, if the product exists.
    pub async fn stock_of(&self, product_id: ProductId) -> Option<u32> {
        self.inner
            .read()
            .await
            .products
            .get(&product_id)
            .map(|p| p.stock)
    }

    /// Removes a product entirely, simulating catalog deletion.
    pub async fn delete_product(&self, product_id: ProductId) -> bool {
        self.inner
            .write()
            .await
            .products
            .remove(&product_id)
            .is_some()
    }

    /// Clears all products, orders and favorites.
    pub async fn clear(&self) {
        let mut inner = self.inner.write().await;
        inner.products.clear();
        inner.orders.clear();
        inner.order_numbers.clear();
        inner.favorites.clear();
    }
}

#[async_trait]
impl ShopStore for InMemoryShopStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn find_orderable(&self, product_id: ProductId) -> Result<Option<Product>> {
        let inner = self.inner.read().await;
        Ok(inner
            .products
            .get(&product_id)
            .filter(|p| p.active)
            .cloned())
    }

    async fn list_active_products(&self) -> Result<Vec<Product>> {
        let inner = self.inner.read().await;
        let mut products: Vec<_> = inner.products.values().filter(|p| p.active).cloned().collect();
        products.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(products)
    }

    async fn insert_product(&self, product: Product) -> Result<()> {
        self.inner.write().await.products.insert(product.id, product);
        Ok(())
    }

    async fn adjust_stock(&self, product_id: ProductId, delta: i64) -> Result<bool> {
        let mut inner = self.inner.write().await;
        let Some(product) = inner.products.get_mut(&product_id) else {
            return Ok(false);
        };
        let new_stock = i64::from(product.stock) + delta;
        if new_stock < 0 {
            return Ok(false);
        }
        product.stock = new_stock as u32;
        product.updated_at = Utc::now();
        Ok(true)
    }

    async fn order_number_exists(&self, order_number: &str) -> Result<bool> {
        Ok(self.inner.read().await.order_numbers.contains(order_number))
    }

    async fn commit_order(&self, new_order: NewOrder) -> Result<Order> {
        let mut inner = self.inner.write().await;

        if inner.order_numbers.contains(&new_order.order_number) {
            return Err(StoreError::DuplicateOrderNumber(new_order.order_number));
        }

        // Re-check the full decrement set before touching anything, so a
        // mid-way failure cannot leave partial state. Quantities are
        // aggregated per product in case the same product appears on
        // several lines.
        let mut decrements: HashMap<ProductId, u32> = HashMap::new();
        for item in &new_order.items {
            *decrements.entry(item.product_id).or_insert(0) += item.quantity;
        }
        for (product_id, quantity) in &decrements {
            let available = inner
                .products
                .get(product_id)
                .filter(|p| p.active)
                .map(|p| p.stock)
                .unwrap_or(0);
            if available < *quantity {
                return Err(StoreError::StockConflict {
                    product_id: *product_id,
                });
            }
        }

        let now = Utc::now();
        for (product_id, quantity) in &decrements {
            let product = inner
                .products
                .get_mut(product_id)
                .expect("checked above while holding the write lock");
            product.stock -= quantity;
            product.updated_at = now;
        }

        let order = Order {
            id: new_order.id,
            order_number: new_order.order_number.clone(),
            user: new_order.user,
            recipient: new_order.recipient,
            status: OrderStatus::Pending,
            total_amount: new_order.total_amount,
            created_at: now,
            updated_at: now,
            items: new_order
                .items
                .into_iter()
                .map(|item| OrderItem {
                    id: Uuid::new_v4(),
                    product: Some(item.product_id),
                    product_name: item.product_name,
                    price: item.price,
                    quantity: item.quantity,
                })
                .collect(),
        };

        inner.order_numbers.insert(order.order_number.clone());
        inner.orders.insert(order.id, order.clone());
        Ok(order)
    }

    async fn get_order(&self, order_id: OrderId) -> Result<Option<Order>> {
        Ok(self.inner.read().await.orders.get(&order_id).cloned())
    }

    async fn get_order_owned(&self, order_id: OrderId, user: UserId) -> Result<Option<Order>> {
        Ok(self
            .inner
            .read()
            .await
            .orders
            .get(&order_id)
            .filter(|o| o.user == Some(user))
            .cloned())
    }

    async fn list_orders_for_user(&self, user: UserId) -> Result<Vec<Order>> {
        let inner = self.inner.read().await;
        let mut orders: Vec<_> = inner
            .orders
            .values()
            .filter(|o| o.user == Some(user))
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    async fn mark_cancelled(&self, order_id: OrderId) -> Result<Order> {
        let mut inner = self.inner.write().await;

        let order = inner
            .orders
            .get(&order_id)
            .ok_or(StoreError::OrderNotFound(order_id))?;
        if !order.status.can_cancel() {
            return Err(StoreError::StatusConflict {
                current: order.status,
            });
        }

        let now = Utc::now();
        let restocks: Vec<(ProductId, u32)> = order
            .items
            .iter()
            .filter_map(|item| item.product.map(|p| (p, item.quantity)))
            .collect();

        // Deleted products are skipped; the cancellation still proceeds.
        for (product_id, quantity) in restocks {
            if let Some(product) = inner.products.get_mut(&product_id) {
                product.stock += quantity;
                product.updated_at = now;
            }
        }

        let order = inner
            .orders
            .get_mut(&order_id)
            .expect("presence checked above while holding the write lock");
        order.status = OrderStatus::Cancelled;
        order.updated_at = now;
        Ok(order.clone())
    }

    async fn update_status(&self, order_id: OrderId, status: OrderStatus) -> Result<Order> {
        let mut inner = self.inner.write().await;
        let order = inner
            .orders
            .get_mut(&order_id)
            .ok_or(StoreError::OrderNotFound(order_id))?;
        order.status = status;
        order.updated_at = Utc::now();
        Ok(order.clone())
    }

    async fn add_favorite(&self, user: UserId, product_id: ProductId) -> Result<bool> {
        let mut inner = self.inner.write().await;
        if !inner.products.contains_key(&product_id) {
            return Err(StoreError::ProductNotFound(product_id));
        }
        let favorites = inner.favorites.entry(user).or_default();
        if favorites.contains(&product_id) {
            return Ok(false);
        }
        favorites.push(product_id);
        Ok(true)
    }

    async fn remove_favorite(&self, user: UserId, product_id: ProductId) -> Result<bool> {
        let mut inner = self.inner.write().await;
        let Some(favorites) = inner.favorites.get_mut(&user) else {
            return Ok(false);
        };
        let before = favorites.len();
        favorites.retain(|p| *p != product_id);
        Ok(favorites.len() < before)
    }

    async fn list_favorites(&self, user: UserId) -> Result<Vec<Product>> {
        let inner = self.inner.read().await;
        let Some(favorites) = inner.favorites.get(&user) else {
            return Ok(Vec::new());
        };
        Ok(favorites
            .iter()
            .rev()
            .filter_map(|p| inner.products.get(p).cloned())
            .collect())
    }
}
