//! Order entities and the order status state machine.

use chrono::{DateTime, Utc};
use common::{Money, OrderId, ProductId, UserId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The status of an order in its lifecycle.
///
/// Transitions:
/// ```text
/// Pending ──► Confirmed ──► Processing ──► Shipped ──► Delivered
///    │            │
///    └────────────┴──► Cancelled
/// ```
///
/// `Delivered` and `Cancelled` are terminal; cancellation is only
/// reachable from `Pending` or `Confirmed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Returns true if the order can still be cancelled.
    pub fn can_cancel(&self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::Confirmed)
    }

    /// Returns true if `to` is a legal next status from this one.
    pub fn can_transition_to(&self, to: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, to),
            (Pending, Confirmed)
                | (Confirmed, Processing)
                | (Processing, Shipped)
                | (Shipped, Delivered)
                | (Pending, Cancelled)
                | (Confirmed, Cancelled)
        )
    }

    /// Returns true if no further transitions are possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// Returns the status name as stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "confirmed" => Ok(OrderStatus::Confirmed),
            "processing" => Ok(OrderStatus::Processing),
            "shipped" => Ok(OrderStatus::Shipped),
            "delivered" => Ok(OrderStatus::Delivered),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(format!("unknown order status {other:?}")),
        }
    }
}

/// Recipient details captured at order time.
///
/// Immutable after creation; the workflow never edits these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub email: Option<String>,
    /// Free-text delivery address.
    pub address: String,
    pub note: Option<String>,
}

/// A line on a persisted order.
///
/// `product_name` and `price` are snapshots taken at order time and are
/// never updated when the live product changes. `product` is kept as a
/// nullable reference so the line survives product deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: Uuid,
    pub product: Option<ProductId>,
    pub product_name: String,
    pub price: Money,
    pub quantity: u32,
}

impl OrderItem {
    /// Returns `price * quantity` for this line.
    pub fn line_total(&self) -> Money {
        self.price.times(self.quantity)
    }
}

/// A persisted order with its items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    /// Externally visible, unique, immutable once assigned.
    pub order_number: String,
    pub user: Option<UserId>,
    pub recipient: Recipient,
    pub status: OrderStatus,
    /// Computed once at creation as the sum of line totals.
    pub total_amount: Money,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub items: Vec<OrderItem>,
}

impl Order {
    /// Recomputes the total from the line items.
    ///
    /// Offered for reconciliation only; `total_amount` is not recomputed
    /// automatically after creation.
    pub fn recomputed_total(&self) -> Money {
        self.items.iter().map(OrderItem::line_total).sum()
    }

    /// Number of lines on the order.
    pub fn item_count(&self) -> usize {
        self.items.len()
    }
}

/// Input for [`crate::ShopStore::commit_order`].
///
/// The store assigns status (`pending`), item IDs and timestamps; the
/// workflow supplies everything else, including the pre-validated stock
/// decrements implied by the items.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub id: OrderId,
    pub order_number: String,
    pub user: Option<UserId>,
    pub recipient: Recipient,
    pub total_amount: Money,
    pub items: Vec<NewOrderItem>,
}

/// A line of a [`NewOrder`], carrying the product snapshot.
#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub product_id: ProductId,
    pub product_name: String,
    pub price: Money,
    pub quantity: u32,
}
