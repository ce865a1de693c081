//! Store error types.

use common::{OrderId, OrderItemId, ProductId, TransactionId};
use domain::InventoryError;
use thiserror::Error;

/// Errors that can occur in storage backends.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No order with the given id.
    #[error("Order not found: {order_id}")]
    OrderNotFound { order_id: OrderId },

    /// No order item with the given id.
    #[error("Order item not found: {item_id}")]
    ItemNotFound { item_id: OrderItemId },

    /// No transaction with the given id.
    #[error("Transaction not found: {transaction_id}")]
    TransactionNotFound { transaction_id: TransactionId },

    /// No inventory record for the given product.
    #[error("No inventory record for product: {product_id}")]
    InventoryNotFound { product_id: ProductId },

    /// An inventory record for this product already exists.
    #[error("Inventory already initialized for product: {product_id}")]
    InventoryAlreadyExists { product_id: ProductId },

    /// Order number collided with an existing order.
    #[error("Duplicate order number: {order_number}")]
    DuplicateOrderNumber { order_number: String },

    /// An inventory precondition failed.
    #[error(transparent)]
    Inventory(#[from] InventoryError),

    /// A stored column held a value the domain does not accept.
    #[error("Invalid stored value for {column}: {value}")]
    InvalidValue { column: &'static str, value: String },

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}
