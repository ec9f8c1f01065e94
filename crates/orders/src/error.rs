//! Workflow error types.

use common::ProductId;
use serde::Serialize;
use store::{OrderStatus, StoreError};
use thiserror::Error;

/// A single problem found while validating a cart.
///
/// Validation never stops at the first problem; every offending line is
/// reported so the caller can correct the cart in one round trip.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CartIssue {
    /// The product does not exist or is not active.
    #[error("product {product_id} is unavailable")]
    Unavailable { product_id: ProductId },

    /// The product exists but has fewer units than requested.
    #[error(
        "insufficient stock for product {product_id}: requested {requested}, available {available}"
    )]
    InsufficientStock {
        product_id: ProductId,
        requested: u32,
        available: u32,
    },

    /// A cart line asked for zero units.
    #[error("invalid quantity for product {product_id}: must be at least 1")]
    InvalidQuantity { product_id: ProductId },
}

fn summarize(issues: &[CartIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Errors returned by the order workflow.
#[derive(Debug, Error)]
pub enum OrderError {
    /// The cart had no lines.
    #[error("cart is empty")]
    EmptyCart,

    /// One or more cart lines failed validation; carries every issue.
    #[error("cart rejected: {}", summarize(.0))]
    Rejected(Vec<CartIssue>),

    /// The order does not exist, or belongs to a different user — the two
    /// are deliberately indistinguishable.
    #[error("order not found")]
    NotFound,

    /// The order's current status does not permit the requested change.
    #[error("invalid transition: order is {current}")]
    InvalidTransition { current: OrderStatus },

    /// A concurrent mutation invalidated the operation. Transient;
    /// callers should retry the whole operation, not resume it.
    #[error("conflicting concurrent update, retry the operation")]
    Conflict,

    /// Store/infrastructure failure.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_lists_every_issue() {
        let a = ProductId::new();
        let b = ProductId::new();
        let err = OrderError::Rejected(vec![
            CartIssue::Unavailable { product_id: a },
            CartIssue::InsufficientStock {
                product_id: b,
                requested: 3,
                available: 1,
            },
        ]);

        let msg = err.to_string();
        assert!(msg.contains(&a.to_string()));
        assert!(msg.contains(&b.to_string()));
        assert!(msg.contains("requested 3, available 1"));
    }

    #[test]
    fn cart_issue_serializes_with_kind_tag() {
        let issue = CartIssue::InsufficientStock {
            product_id: ProductId::new(),
            requested: 2,
            available: 0,
        };
        let json = serde_json::to_value(&issue).unwrap();
        assert_eq!(json["kind"], "insufficient_stock");
        assert_eq!(json["requested"], 2);
        assert_eq!(json["available"], 0);
    }
}
