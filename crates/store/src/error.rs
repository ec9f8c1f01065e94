use common::{OrderId, ProductId};
use thiserror::Error;

use crate::OrderStatus;

/// Errors that can occur when interacting with the shop store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The order does not exist (or is not visible to the caller).
    #[error("order not found: {0}")]
    OrderNotFound(OrderId),

    /// The product does not exist.
    #[error("product not found: {0}")]
    ProductNotFound(ProductId),

    /// The generated order number collided with an existing one.
    /// Callers regenerate and retry.
    #[error("duplicate order number: {0}")]
    DuplicateOrderNumber(String),

    /// A stock decrement could not be applied without driving stock
    /// negative. Raised inside the atomic commit when a concurrent
    /// mutation invalidated the validation-time snapshot.
    #[error("stock conflict on product {product_id}")]
    StockConflict { product_id: ProductId },

    /// The order's status changed under us and the requested mutation is
    /// no longer legal.
    #[error("order status conflict: order is {current}")]
    StatusConflict { current: OrderStatus },

    /// A stored status value could not be decoded.
    #[error("invalid status value in store: {0:?}")]
    InvalidStatus(String),

    /// A database error occurred.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
