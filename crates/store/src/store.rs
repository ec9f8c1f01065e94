//! The `ShopStore` trait.

use async_trait::async_trait;
use common::{OrderId, ProductId, UserId};

use crate::{NewOrder, Order, OrderStatus, Product, Result};

/// Storage operations shared by the in-memory and PostgreSQL stores.
///
/// The two compound mutations, [`commit_order`](ShopStore::commit_order)
/// and [`mark_cancelled`](ShopStore::mark_cancelled), are atomic: they
/// either apply every write they describe or none of them, and they
/// serialize against concurrent stock mutations on the same products.
#[async_trait]
pub trait ShopStore: Send + Sync {
    /// Short name of the backing implementation, for diagnostics.
    fn backend_name(&self) -> &'static str;

    // -- Catalog --

    /// Looks up a product that can be ordered right now.
    ///
    /// Returns `None` for unknown and for inactive products alike.
    async fn find_orderable(&self, product_id: ProductId) -> Result<Option<Product>>;

    /// Lists active products, newest first.
    async fn list_active_products(&self) -> Result<Vec<Product>>;

    /// Inserts a product into the catalog.
    async fn insert_product(&self, product: Product) -> Result<()>;

    /// Adjusts a product's stock by `delta`, refusing to go negative.
    ///
    /// Administrative entry point for restocks and corrections. The
    /// compound operations do their own stock math inside their atomic
    /// units and never call this.
    ///
    /// Returns `false` if the product does not exist or the adjustment
    /// would drive stock below zero.
    async fn adjust_stock(&self, product_id: ProductId, delta: i64) -> Result<bool>;

    // -- Orders --

    /// Returns true if an order with this order number already exists.
    async fn order_number_exists(&self, order_number: &str) -> Result<bool>;

    /// Atomically persists an order: the order row, one row per item, and
    /// a stock decrement for every item's product.
    ///
    /// Fails with [`StoreError::StockConflict`] if any decrement would
    /// drive stock negative, and with
    /// [`StoreError::DuplicateOrderNumber`] on an order-number collision.
    /// On failure no write is visible.
    ///
    /// [`StoreError::StockConflict`]: crate::StoreError::StockConflict
    /// [`StoreError::DuplicateOrderNumber`]: crate::StoreError::DuplicateOrderNumber
    async fn commit_order(&self, new_order: NewOrder) -> Result<Order>;

    /// Loads an order with its items.
    async fn get_order(&self, order_id: OrderId) -> Result<Option<Order>>;

    /// Loads an order only if it belongs to `user`.
    ///
    /// Absent and not-owned are indistinguishable (`None` for both), so
    /// callers cannot probe for other users' order IDs.
    async fn get_order_owned(&self, order_id: OrderId, user: UserId) -> Result<Option<Order>>;

    /// Lists a user's orders, newest first.
    async fn list_orders_for_user(&self, user: UserId) -> Result<Vec<Order>>;

    /// Atomically cancels an order: restores stock for every item whose
    /// product still exists, then sets the status to `cancelled`.
    ///
    /// The cancellable-status check is re-verified inside the atomic
    /// unit; a lost race surfaces as [`StoreError::StatusConflict`].
    /// Items whose product was deleted are skipped for restock but do
    /// not block cancellation.
    ///
    /// [`StoreError::StatusConflict`]: crate::StoreError::StatusConflict
    async fn mark_cancelled(&self, order_id: OrderId) -> Result<Order>;

    /// Writes a new status onto an order (administrative transitions).
    ///
    /// Plain field assignment plus an `updated_at` refresh; legality of
    /// the transition is the caller's responsibility.
    async fn update_status(&self, order_id: OrderId, status: OrderStatus) -> Result<Order>;

    // -- Favorites --

    /// Adds a product to a user's favorites.
    ///
    /// Returns `true` if the product was newly added, `false` if it was
    /// already a favorite. Fails with [`StoreError::ProductNotFound`] for
    /// an unknown product.
    ///
    /// [`StoreError::ProductNotFound`]: crate::StoreError::ProductNotFound
    async fn add_favorite(&self, user: UserId, product_id: ProductId) -> Result<bool>;

    /// Removes a product from a user's favorites.
    ///
    /// Returns `false` if the product was not a favorite.
    async fn remove_favorite(&self, user: UserId, product_id: ProductId) -> Result<bool>;

    /// Lists a user's favorite products, most recently added first.
    ///
    /// Products deleted from the catalog drop out of the list.
    async fn list_favorites(&self, user: UserId) -> Result<Vec<Product>>;
}
