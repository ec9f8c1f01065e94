//! Persistent store for the NextStore backend.
//!
//! This crate owns the entity types ([`Product`], [`Order`], [`OrderItem`])
//! and the [`ShopStore`] trait that the order workflow runs against. Two
//! implementations are provided:
//! - [`InMemoryShopStore`] for tests and local development,
//! - [`PostgresShopStore`] backed by sqlx transactions.
//!
//! Every multi-row mutation (`commit_order`, `mark_cancelled`) is a single
//! atomic unit in both implementations; partial writes are never visible.

pub mod error;
pub mod memory;
pub mod order;
pub mod postgres;
pub mod product;
pub mod store;

pub use error::{Result, StoreError};
pub use memory::InMemoryShopStore;
pub use order::{NewOrder, NewOrderItem, Order, OrderItem, OrderStatus, Recipient};
pub use postgres::PostgresShopStore;
pub use product::Product;
pub use store::ShopStore;
