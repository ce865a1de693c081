//! Notification events emitted as orders move through their lifecycle.

use std::sync::Arc;

use async_trait::async_trait;
use common::{OrderId, OrderItemId};
use tokio::sync::RwLock;

/// Events published to interested parties (warehouse, account managers).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationEvent {
    /// Points were debited and fulfillment has started.
    OrderConfirmed {
        order_id: OrderId,
        order_number: String,
    },
    /// A physical item is waiting for the warehouse to ship it.
    PhysicalFulfillmentNeeded {
        order_id: OrderId,
        item_id: OrderItemId,
    },
    /// A physical item left the warehouse.
    ItemShipped {
        order_id: OrderId,
        item_id: OrderItemId,
        tracking_number: String,
    },
    /// A physical item reached the customer.
    ItemDelivered {
        order_id: OrderId,
        item_id: OrderItemId,
    },
    /// A virtual item was delivered electronically.
    VirtualItemDelivered {
        order_id: OrderId,
        item_id: OrderItemId,
        reference: String,
    },
    /// An item could not be fulfilled.
    FulfillmentFailed {
        order_id: OrderId,
        item_id: OrderItemId,
        reason: String,
    },
    /// Every item reached its customer.
    OrderCompleted {
        order_id: OrderId,
        order_number: String,
    },
    /// The order was cancelled.
    OrderCancelled {
        order_id: OrderId,
        order_number: String,
        reason: String,
    },
}

/// Sink for lifecycle notifications. Delivery is best-effort; a sink must
/// not fail the operation that emitted the event.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(&self, event: NotificationEvent);
}

/// Emits notifications as structured log events.
///
/// Stand-in for a real outbound channel (email, webhook); the events carry
/// everything a downstream integration needs.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingNotifications;

#[async_trait]
impl NotificationSink for LoggingNotifications {
    async fn notify(&self, event: NotificationEvent) {
        tracing::info!(?event, "Order notification");
    }
}

/// Records notifications in memory for assertions in tests.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifications {
    events: Arc<RwLock<Vec<NotificationEvent>>>,
}

impl RecordingNotifications {
    /// Creates an empty recording sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all recorded events in emission order.
    pub async fn events(&self) -> Vec<NotificationEvent> {
        self.events.read().await.clone()
    }

    /// Returns the number of recorded events.
    pub async fn count(&self) -> usize {
        self.events.read().await.len()
    }

    /// Returns true if any recorded event matches the predicate.
    pub async fn contains(&self, predicate: impl Fn(&NotificationEvent) -> bool) -> bool {
        self.events.read().await.iter().any(predicate)
    }
}

#[async_trait]
impl NotificationSink for RecordingNotifications {
    async fn notify(&self, event: NotificationEvent) {
        self.events.write().await.push(event);
    }
}
