//! # Notification Port
//!
//! The outbound boundary for everything the engine wants a human to hear
//! about. Delivery semantics (websocket, e-mail, queue) live entirely
//! behind the trait; the engine only decides *what* to announce and *when*.
//!
//! ## Fan-Out Contract
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                  Post-Commit Fan-Out                                    │
//! │                                                                         │
//! │  sale transaction ──commit──► notify_new_sale                          │
//! │                               per touched product:                      │
//! │                                 stock = 0        → notify_out_of_stock  │
//! │                                 0 < stock ≤ min  → notify_low_stock     │
//! │                                                                         │
//! │  status update ──────────────► delivered  → notify_order_delivered     │
//! │  (customer sales only)         otherwise  → notify_order_status_changed│
//! │                                                                         │
//! │  A port failure is logged at warn. It never fails the operation,       │
//! │  never rolls anything back, and is never retried by the engine.        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use mobilia_core::SaleStatus;

// =============================================================================
// Events
// =============================================================================

/// A sale was created and committed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSaleEvent {
    pub sale_id: String,
    pub sale_number: String,
    pub total_cents: i64,
    pub store_id: String,
    pub store_name: Option<String>,
    pub employee_id: String,
    pub customer_name: Option<String>,
}

/// A product's stock dropped to its threshold or below (but not to zero).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LowStockEvent {
    pub product_id: String,
    pub product_name: String,
    pub stock: i64,
    pub min_stock: i64,
    pub store_id: String,
}

/// A product's stock reached zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutOfStockEvent {
    pub product_id: String,
    pub product_name: String,
    pub store_id: String,
}

/// A customer's order moved to a new status.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStatusEvent {
    pub customer_id: String,
    pub sale_id: String,
    pub sale_number: String,
    pub new_status: SaleStatus,
}

/// A customer's order was delivered.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDeliveredEvent {
    pub customer_id: String,
    pub sale_id: String,
    pub sale_number: String,
}

// =============================================================================
// Port
// =============================================================================

/// Delivery failure reported by a port implementation.
#[derive(Debug, Error)]
#[error("notification delivery failed: {0}")]
pub struct NotifyError(pub String);

/// The outbound notification boundary.
///
/// Implementations must be cheap to call from the request path; anything
/// slow belongs on the far side of the port (a queue, a spawned task).
#[async_trait]
pub trait NotificationPort: Send + Sync {
    async fn notify_new_sale(&self, event: NewSaleEvent) -> Result<(), NotifyError>;

    async fn notify_low_stock(&self, event: LowStockEvent) -> Result<(), NotifyError>;

    async fn notify_out_of_stock(&self, event: OutOfStockEvent) -> Result<(), NotifyError>;

    async fn notify_order_status_changed(&self, event: OrderStatusEvent)
        -> Result<(), NotifyError>;

    async fn notify_order_delivered(&self, event: OrderDeliveredEvent) -> Result<(), NotifyError>;
}

// =============================================================================
// Default Implementation
// =============================================================================

/// Port implementation that writes every event to the structured log.
///
/// The default when no real channel is wired up, and a reasonable one for
/// single-terminal deployments where the log *is* the back office.
#[derive(Debug, Default, Clone)]
pub struct TracingNotifier;

#[async_trait]
impl NotificationPort for TracingNotifier {
    async fn notify_new_sale(&self, event: NewSaleEvent) -> Result<(), NotifyError> {
        info!(
            sale_number = %event.sale_number,
            total_cents = event.total_cents,
            store_id = %event.store_id,
            "New sale"
        );
        Ok(())
    }

    async fn notify_low_stock(&self, event: LowStockEvent) -> Result<(), NotifyError> {
        info!(
            product = %event.product_name,
            stock = event.stock,
            min_stock = event.min_stock,
            "Low stock"
        );
        Ok(())
    }

    async fn notify_out_of_stock(&self, event: OutOfStockEvent) -> Result<(), NotifyError> {
        info!(product = %event.product_name, "Out of stock");
        Ok(())
    }

    async fn notify_order_status_changed(
        &self,
        event: OrderStatusEvent,
    ) -> Result<(), NotifyError> {
        info!(
            sale_number = %event.sale_number,
            status = %event.new_status,
            customer_id = %event.customer_id,
            "Order status changed"
        );
        Ok(())
    }

    async fn notify_order_delivered(&self, event: OrderDeliveredEvent) -> Result<(), NotifyError> {
        info!(
            sale_number = %event.sale_number,
            customer_id = %event.customer_id,
            "Order delivered"
        );
        Ok(())
    }
}
