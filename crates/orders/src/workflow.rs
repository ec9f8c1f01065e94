//! The order workflow engine.

use std::sync::Arc;

use chrono::Utc;
use common::{Money, OrderId, ProductId, UserId};
use serde::{Deserialize, Serialize};
use store::{NewOrder, NewOrderItem, Order, OrderStatus, Recipient, ShopStore, StoreError};

use crate::error::{CartIssue, OrderError};
use crate::notifier::{Notifier, OrderSummary};
use crate::number;

/// One requested line of a cart: which product, how many units.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// A request to place an order.
///
/// The API boundary has already authenticated `user` (when present) and
/// shaped the payload; the workflow owns all stock and cart validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceOrder {
    pub user: Option<UserId>,
    pub recipient: Recipient,
    pub lines: Vec<CartLine>,
}

/// Drives order placement, cancellation and administrative status moves
/// against a [`ShopStore`], with confirmations going out through a
/// [`Notifier`].
pub struct OrderWorkflow<S: ShopStore, N: Notifier> {
    store: S,
    notifier: Arc<N>,
}

impl<S, N> OrderWorkflow<S, N>
where
    S: ShopStore,
    N: Notifier + 'static,
{
    /// Creates a new workflow over the given store and notifier.
    pub fn new(store: S, notifier: N) -> Self {
        Self {
            store,
            notifier: Arc::new(notifier),
        }
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Places an order: validates the whole cart, then commits the order,
    /// its item snapshots and the stock decrements as one atomic unit.
    ///
    /// Validation reports **all** problems, not just the first. On any
    /// failure no state has changed. A confirmation email is dispatched
    /// after commit when the recipient supplied an address; its outcome
    /// never affects the returned order.
    #[tracing::instrument(skip(self, req), fields(lines = req.lines.len()))]
    pub async fn place_order(&self, req: PlaceOrder) -> Result<Order, OrderError> {
        metrics::counter!("orders_place_attempts_total").increment(1);
        let started = std::time::Instant::now();

        if req.lines.is_empty() {
            metrics::counter!("orders_rejected_total").increment(1);
            return Err(OrderError::EmptyCart);
        }

        // Resolve every line against the catalog, collecting every issue.
        let mut issues = Vec::new();
        let mut items = Vec::with_capacity(req.lines.len());
        for line in &req.lines {
            if line.quantity == 0 {
                issues.push(CartIssue::InvalidQuantity {
                    product_id: line.product_id,
                });
                continue;
            }
            match self.store.find_orderable(line.product_id).await? {
                None => issues.push(CartIssue::Unavailable {
                    product_id: line.product_id,
                }),
                Some(product) if product.stock < line.quantity => {
                    issues.push(CartIssue::InsufficientStock {
                        product_id: line.product_id,
                        requested: line.quantity,
                        available: product.stock,
                    });
                }
                Some(product) => items.push(NewOrderItem {
                    product_id: product.id,
                    product_name: product.name,
                    price: product.price,
                    quantity: line.quantity,
                }),
            }
        }
        if !issues.is_empty() {
            metrics::counter!("orders_rejected_total").increment(1);
            return Err(OrderError::Rejected(issues));
        }

        let total_amount: Money = items
            .iter()
            .map(|item| item.price.times(item.quantity))
            .sum();

        let order_id = OrderId::new();
        let order = loop {
            let order_number = number::generate(Utc::now().date_naive());
            let new_order = NewOrder {
                id: order_id,
                order_number,
                user: req.user,
                recipient: req.recipient.clone(),
                total_amount,
                items: items.clone(),
            };

            match self.store.commit_order(new_order).await {
                Ok(order) => break order,
                Err(StoreError::DuplicateOrderNumber(number)) => {
                    // The 4-digit suffix collided; draw a fresh one.
                    tracing::debug!(%number, "order number collision, regenerating");
                }
                Err(StoreError::StockConflict { product_id }) => {
                    // Validation passed moments ago, so someone else took
                    // the stock in between. Transient: retry the whole
                    // operation.
                    tracing::warn!(%product_id, "stock changed during commit");
                    metrics::counter!("orders_conflicts_total").increment(1);
                    return Err(OrderError::Conflict);
                }
                Err(e) => return Err(OrderError::Store(e)),
            }
        };

        self.dispatch_confirmation(&order);

        metrics::counter!("orders_placed_total").increment(1);
        metrics::histogram!("orders_place_duration_seconds")
            .record(started.elapsed().as_secs_f64());
        tracing::info!(
            order_id = %order.id,
            order_number = %order.order_number,
            total = %order.total_amount,
            "order placed"
        );
        Ok(order)
    }

    /// Cancels an order on behalf of its owner, restoring stock for every
    /// item whose product still exists.
    ///
    /// An order that does not exist and an order owned by someone else
    /// fail identically with [`OrderError::NotFound`].
    #[tracing::instrument(skip(self))]
    pub async fn cancel_order(
        &self,
        order_id: OrderId,
        requester: UserId,
    ) -> Result<Order, OrderError> {
        let order = self
            .store
            .get_order_owned(order_id, requester)
            .await?
            .ok_or(OrderError::NotFound)?;

        if !order.status.can_cancel() {
            return Err(OrderError::InvalidTransition {
                current: order.status,
            });
        }

        match self.store.mark_cancelled(order_id).await {
            Ok(order) => {
                metrics::counter!("orders_cancelled_total").increment(1);
                tracing::info!(order_id = %order.id, "order cancelled");
                Ok(order)
            }
            // The status moved between our check and the atomic step.
            Err(StoreError::StatusConflict { current }) => {
                Err(OrderError::InvalidTransition { current })
            }
            Err(StoreError::OrderNotFound(_)) => Err(OrderError::NotFound),
            Err(e) => Err(OrderError::Store(e)),
        }
    }

    /// Applies an administrative status transition (confirm, process,
    /// ship, deliver — or cancel with restock).
    ///
    /// Operator-driven; there is no ownership check here. Illegal moves
    /// fail with [`OrderError::InvalidTransition`].
    #[tracing::instrument(skip(self))]
    pub async fn advance_status(
        &self,
        order_id: OrderId,
        to: OrderStatus,
    ) -> Result<Order, OrderError> {
        let order = self
            .store
            .get_order(order_id)
            .await?
            .ok_or(OrderError::NotFound)?;

        if !order.status.can_transition_to(to) {
            return Err(OrderError::InvalidTransition {
                current: order.status,
            });
        }

        if to == OrderStatus::Cancelled {
            // Administrative cancellation restocks exactly like a
            // customer cancellation, atomically per order.
            return match self.store.mark_cancelled(order_id).await {
                Ok(order) => Ok(order),
                Err(StoreError::StatusConflict { current }) => {
                    Err(OrderError::InvalidTransition { current })
                }
                Err(e) => Err(OrderError::Store(e)),
            };
        }

        Ok(self.store.update_status(order_id, to).await?)
    }

    /// Loads an order by ID.
    pub async fn get_order(&self, order_id: OrderId) -> Result<Option<Order>, OrderError> {
        Ok(self.store.get_order(order_id).await?)
    }

    /// Loads an order, scoped to its owner.
    pub async fn get_order_for_user(
        &self,
        order_id: OrderId,
        user: UserId,
    ) -> Result<Option<Order>, OrderError> {
        Ok(self.store.get_order_owned(order_id, user).await?)
    }

    /// Lists a user's orders, newest first.
    pub async fn list_orders(&self, user: UserId) -> Result<Vec<Order>, OrderError> {
        Ok(self.store.list_orders_for_user(user).await?)
    }

    /// Fires the confirmation email without blocking or failing the
    /// placement result.
    fn dispatch_confirmation(&self, order: &Order) {
        let Some(email) = order.recipient.email.clone() else {
            return;
        };
        let summary = OrderSummary::from(order);
        let notifier = Arc::clone(&self.notifier);
        tokio::spawn(async move {
            if let Err(e) = notifier.send_order_confirmation(&email, &summary).await {
                tracing::warn!(
                    email,
                    order_number = %summary.order_number,
                    error = %e,
                    "order confirmation failed"
                );
            }
        });
    }
}
