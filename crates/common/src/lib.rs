//! Shared types for the NextStore backend.
//!
//! Provides UUID-backed identifier newtypes and the cents-backed [`Money`]
//! type used for all price arithmetic.

pub mod ids;
pub mod money;

pub use ids::{OrderId, ProductId, UserId};
pub use money::{Money, MoneyParseError};
