//! Order placement and inventory-reservation workflow.
//!
//! This crate is the one place in the backend with multi-step consistency
//! requirements: validate stock, create the order with its line-item
//! snapshots, decrement stock — all as one atomic unit — and restore
//! stock on cancellation. Everything else (identity, email transport,
//! HTTP) is an external collaborator.
//!
//! The engine is generic over a [`store::ShopStore`] for persistence and
//! a [`Notifier`] for best-effort confirmation emails.

pub mod error;
pub mod notifier;
pub mod number;
pub mod workflow;

pub use error::{CartIssue, OrderError};
pub use notifier::{InMemoryNotifier, LoggingNotifier, Notifier, NotifyError, OrderSummary};
pub use workflow::{CartLine, OrderWorkflow, PlaceOrder};
