//! Redemption orders and their line items.

mod entity;
mod item;
mod status;

pub use entity::RedemptionOrder;
pub use item::OrderItem;
pub use status::{FulfillmentStatus, OrderStatus};

use thiserror::Error;

use crate::catalog::ProductType;

/// Errors that can occur during order operations.
#[derive(Debug, Error)]
pub enum OrderError {
    /// Order is not in the expected status.
    #[error("Invalid state transition: cannot {action} from {current_status} status")]
    InvalidStateTransition {
        current_status: OrderStatus,
        action: &'static str,
    },

    /// Item is not in the expected fulfillment status.
    #[error("Invalid item transition: cannot {action} from {current_status} status")]
    InvalidItemTransition {
        current_status: FulfillmentStatus,
        action: &'static str,
    },

    /// Operation does not apply to this product type.
    #[error("Cannot {action} a {product_type} item")]
    WrongProductType {
        product_type: ProductType,
        action: &'static str,
    },

    /// Quantity must be at least one.
    #[error("Invalid quantity: {quantity} (must be greater than 0)")]
    InvalidQuantity { quantity: u32 },

    /// Points cost per item must be positive.
    #[error("Invalid points amount: {points} (must be greater than 0)")]
    InvalidPointsAmount { points: i64 },

    /// Order must contain at least one item.
    #[error("Order has no items")]
    NoItems,
}
