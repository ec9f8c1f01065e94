//! Notifier trait and implementations.
//!
//! Email transport is an external collaborator: the workflow only needs
//! a best-effort "send order confirmation" capability whose failures are
//! logged and swallowed, never surfaced to the caller.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::Money;
use store::Order;
use thiserror::Error;

/// The slice of an order a confirmation message needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderSummary {
    pub order_number: String,
    pub total_amount: Money,
}

impl From<&Order> for OrderSummary {
    fn from(order: &Order) -> Self {
        Self {
            order_number: order.order_number.clone(),
            total_amount: order.total_amount,
        }
    }
}

/// Error returned by a notifier.
#[derive(Debug, Clone, Error)]
#[error("notification failed: {0}")]
pub struct NotifyError(pub String);

/// Trait for sending order confirmations.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Sends an order confirmation to `email`.
    async fn send_order_confirmation(
        &self,
        email: &str,
        summary: &OrderSummary,
    ) -> Result<(), NotifyError>;
}

/// Notifier that only writes a structured log line.
///
/// Stands in for a real mail transport in local development.
#[derive(Debug, Clone, Default)]
pub struct LoggingNotifier;

impl LoggingNotifier {
    /// Creates a new logging notifier.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Notifier for LoggingNotifier {
    async fn send_order_confirmation(
        &self,
        email: &str,
        summary: &OrderSummary,
    ) -> Result<(), NotifyError> {
        tracing::info!(
            email,
            order_number = %summary.order_number,
            total = %summary.total_amount,
            "order confirmation sent"
        );
        Ok(())
    }
}

#[derive(Debug, Default)]
struct InMemoryNotifierState {
    sent: Vec<(String, OrderSummary)>,
    fail_on_send: bool,
}

/// In-memory notifier for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryNotifier {
    state: Arc<RwLock<InMemoryNotifierState>>,
}

impl InMemoryNotifier {
    /// Creates a new in-memory notifier.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the notifier to fail on subsequent send calls.
    pub fn set_fail_on_send(&self, fail: bool) {
        self.state.write().unwrap().fail_on_send = fail;
    }

    /// Returns the number of confirmations sent.
    pub fn sent_count(&self) -> usize {
        self.state.read().unwrap().sent.len()
    }

    /// Returns true if a confirmation was sent to `email`.
    pub fn has_sent_to(&self, email: &str) -> bool {
        self.state
            .read()
            .unwrap()
            .sent
            .iter()
            .any(|(to, _)| to == email)
    }

    /// Returns the most recently sent confirmation, if any.
    pub fn last_sent(&self) -> Option<(String, OrderSummary)> {
        self.state.read().unwrap().sent.last().cloned()
    }
}

#[async_trait]
impl Notifier for InMemoryNotifier {
    async fn send_order_confirmation(
        &self,
        email: &str,
        summary: &OrderSummary,
    ) -> Result<(), NotifyError> {
        let mut state = self.state.write().unwrap();

        if state.fail_on_send {
            return Err(NotifyError("SMTP unavailable".to_string()));
        }

        state.sent.push((email.to_string(), summary.clone()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_sent_confirmations() {
        let notifier = InMemoryNotifier::new();
        let summary = OrderSummary {
            order_number: "NS-202503070042".to_string(),
            total_amount: Money::from_cents(2000),
        };

        notifier
            .send_order_confirmation("buyer@example.com", &summary)
            .await
            .unwrap();

        assert_eq!(notifier.sent_count(), 1);
        assert!(notifier.has_sent_to("buyer@example.com"));
        assert_eq!(notifier.last_sent().unwrap().1, summary);
    }

    #[tokio::test]
    async fn fail_on_send() {
        let notifier = InMemoryNotifier::new();
        notifier.set_fail_on_send(true);

        let summary = OrderSummary {
            order_number: "NS-202503070042".to_string(),
            total_amount: Money::from_cents(2000),
        };
        let result = notifier
            .send_order_confirmation("buyer@example.com", &summary)
            .await;

        assert!(result.is_err());
        assert_eq!(notifier.sent_count(), 0);
    }
}
