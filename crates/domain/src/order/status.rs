//! Order and line-item state machines.

use serde::{Deserialize, Serialize};

/// The status of a redemption order in its lifecycle.
///
/// Status transitions:
/// ```text
/// Pending ──┬──► Processing ──► Completed
///           │        │
///           │        └──► Cancelled
///           ├──► Cancelled
///           └──► Failed
/// ```
///
/// `Completed`, `Cancelled`, and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OrderStatus {
    /// Created and validated, inventory reserved, points not yet debited.
    #[default]
    Pending,

    /// Points debited, items are being fulfilled.
    Processing,

    /// Every item fulfilled or delivered (terminal).
    Completed,

    /// Cancelled by request; points refunded if they had been debited
    /// (terminal).
    Cancelled,

    /// Points debit failed, reservations released (terminal).
    Failed,
}

impl OrderStatus {
    /// Returns true if the points debit can start in this status.
    pub fn can_process(&self) -> bool {
        matches!(self, OrderStatus::Pending)
    }

    /// Returns true if the order can be completed in this status.
    pub fn can_complete(&self) -> bool {
        matches!(self, OrderStatus::Processing)
    }

    /// Returns true if the order can be cancelled in this status.
    ///
    /// `Failed` orders are not cancellable: their reservations were already
    /// released when the debit failed.
    pub fn can_cancel(&self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::Processing)
    }

    /// Returns true if the order can be failed in this status.
    pub fn can_fail(&self) -> bool {
        matches!(self, OrderStatus::Pending)
    }

    /// Returns true if this is a terminal status.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Completed | OrderStatus::Cancelled | OrderStatus::Failed
        )
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Processing => "Processing",
            OrderStatus::Completed => "Completed",
            OrderStatus::Cancelled => "Cancelled",
            OrderStatus::Failed => "Failed",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The fulfillment status of a single line item.
///
/// Physical items: `Pending ─► Processing ─► Shipped ─► Delivered`.
/// Virtual items: `Pending ─► Processing ─► Fulfilled`.
/// Either kind can move to `Failed` while not yet complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum FulfillmentStatus {
    /// Waiting for the order's points debit.
    #[default]
    Pending,

    /// Fulfillment has started.
    Processing,

    /// Virtual item delivered electronically (terminal).
    Fulfilled,

    /// Physical item handed to the carrier.
    Shipped,

    /// Physical item received (terminal).
    Delivered,

    /// Fulfillment failed (terminal).
    Failed,
}

impl FulfillmentStatus {
    /// Returns true if fulfillment can start.
    pub fn can_begin(&self) -> bool {
        matches!(self, FulfillmentStatus::Pending)
    }

    /// Returns true if the item can be marked shipped.
    pub fn can_ship(&self) -> bool {
        matches!(self, FulfillmentStatus::Processing)
    }

    /// Returns true if the item can be marked delivered.
    pub fn can_deliver(&self) -> bool {
        matches!(self, FulfillmentStatus::Shipped)
    }

    /// Returns true if the item can be marked fulfilled.
    pub fn can_fulfill(&self) -> bool {
        matches!(self, FulfillmentStatus::Processing)
    }

    /// Returns true if the item can be marked failed.
    pub fn can_fail(&self) -> bool {
        matches!(self, FulfillmentStatus::Pending | FulfillmentStatus::Processing)
    }

    /// Returns true if the item has reached its customer.
    pub fn is_complete(&self) -> bool {
        matches!(self, FulfillmentStatus::Fulfilled | FulfillmentStatus::Delivered)
    }

    /// Returns true if this is a terminal status.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            FulfillmentStatus::Fulfilled | FulfillmentStatus::Delivered | FulfillmentStatus::Failed
        )
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            FulfillmentStatus::Pending => "Pending",
            FulfillmentStatus::Processing => "Processing",
            FulfillmentStatus::Fulfilled => "Fulfilled",
            FulfillmentStatus::Shipped => "Shipped",
            FulfillmentStatus::Delivered => "Delivered",
            FulfillmentStatus::Failed => "Failed",
        }
    }
}

impl std::fmt::Display for FulfillmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_order_status_is_pending() {
        assert_eq!(OrderStatus::default(), OrderStatus::Pending);
    }

    #[test]
    fn test_pending_can_process() {
        assert!(OrderStatus::Pending.can_process());
        assert!(!OrderStatus::Processing.can_process());
        assert!(!OrderStatus::Completed.can_process());
        assert!(!OrderStatus::Cancelled.can_process());
        assert!(!OrderStatus::Failed.can_process());
    }

    #[test]
    fn test_processing_can_complete() {
        assert!(!OrderStatus::Pending.can_complete());
        assert!(OrderStatus::Processing.can_complete());
        assert!(!OrderStatus::Completed.can_complete());
        assert!(!OrderStatus::Cancelled.can_complete());
        assert!(!OrderStatus::Failed.can_complete());
    }

    #[test]
    fn test_cancel_only_from_pending_or_processing() {
        assert!(OrderStatus::Pending.can_cancel());
        assert!(OrderStatus::Processing.can_cancel());
        assert!(!OrderStatus::Completed.can_cancel());
        assert!(!OrderStatus::Cancelled.can_cancel());
        assert!(!OrderStatus::Failed.can_cancel());
    }

    #[test]
    fn test_fail_only_from_pending() {
        assert!(OrderStatus::Pending.can_fail());
        assert!(!OrderStatus::Processing.can_fail());
        assert!(!OrderStatus::Completed.can_fail());
    }

    #[test]
    fn test_order_terminal_statuses() {
        assert!(!OrderStatus::Pending.is_terminal());
        assert!(!OrderStatus::Processing.is_terminal());
        assert!(OrderStatus::Completed.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
        assert!(OrderStatus::Failed.is_terminal());
    }

    #[test]
    fn test_order_status_display() {
        assert_eq!(OrderStatus::Pending.to_string(), "Pending");
        assert_eq!(OrderStatus::Processing.to_string(), "Processing");
        assert_eq!(OrderStatus::Completed.to_string(), "Completed");
        assert_eq!(OrderStatus::Cancelled.to_string(), "Cancelled");
        assert_eq!(OrderStatus::Failed.to_string(), "Failed");
    }

    #[test]
    fn test_item_ship_only_from_processing() {
        assert!(!FulfillmentStatus::Pending.can_ship());
        assert!(FulfillmentStatus::Processing.can_ship());
        assert!(!FulfillmentStatus::Shipped.can_ship());
        assert!(!FulfillmentStatus::Delivered.can_ship());
    }

    #[test]
    fn test_item_deliver_only_from_shipped() {
        assert!(!FulfillmentStatus::Processing.can_deliver());
        assert!(FulfillmentStatus::Shipped.can_deliver());
        assert!(!FulfillmentStatus::Delivered.can_deliver());
    }

    #[test]
    fn test_item_complete_statuses() {
        assert!(FulfillmentStatus::Fulfilled.is_complete());
        assert!(FulfillmentStatus::Delivered.is_complete());
        assert!(!FulfillmentStatus::Shipped.is_complete());
        assert!(!FulfillmentStatus::Failed.is_complete());
    }

    #[test]
    fn test_item_terminal_statuses() {
        assert!(FulfillmentStatus::Fulfilled.is_terminal());
        assert!(FulfillmentStatus::Delivered.is_terminal());
        assert!(FulfillmentStatus::Failed.is_terminal());
        assert!(!FulfillmentStatus::Pending.is_terminal());
        assert!(!FulfillmentStatus::Processing.is_terminal());
        assert!(!FulfillmentStatus::Shipped.is_terminal());
    }

    #[test]
    fn test_serialization() {
        let status = OrderStatus::Processing;
        let json = serde_json::to_string(&status).unwrap();
        let back: OrderStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(status, back);
    }
}
