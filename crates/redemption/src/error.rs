//! Redemption error types.

use common::{AccountManagerId, CompanyId, OrderId, OrderItemId, ProductId};
use domain::{OrderError, OrderStatus, TransactionError};
use ledger_client::LedgerError;
use store::StoreError;
use thiserror::Error;

/// Errors that can occur while orchestrating redemption orders.
#[derive(Debug, Error)]
pub enum RedemptionError {
    /// No company with the given id.
    #[error("Company not found: {company_id}")]
    CompanyNotFound { company_id: CompanyId },

    /// Company exists but is deactivated.
    #[error("Company is inactive: {company_id}")]
    CompanyInactive { company_id: CompanyId },

    /// Company has no loyalty account to redeem from.
    #[error("Company has no loyalty account: {company_id}")]
    NoLoyaltyAccount { company_id: CompanyId },

    /// No account manager with the given id.
    #[error("Account manager not found: {manager_id}")]
    AccountManagerNotFound { manager_id: AccountManagerId },

    /// Account manager exists but is deactivated.
    #[error("Account manager is inactive: {manager_id}")]
    AccountManagerInactive { manager_id: AccountManagerId },

    /// Account manager belongs to a different company.
    #[error("Account manager {manager_id} does not belong to company {company_id}")]
    AccountManagerMismatch {
        manager_id: AccountManagerId,
        company_id: CompanyId,
    },

    /// No product with the given id.
    #[error("Product not found: {product_id}")]
    ProductNotFound { product_id: ProductId },

    /// Product exists but is no longer redeemable.
    #[error("Product is inactive: {product_id}")]
    ProductInactive { product_id: ProductId },

    /// Order request contained no lines.
    #[error("Order has no items")]
    EmptyOrder,

    /// Not enough stock for a physical product.
    #[error("Insufficient inventory for {product_id}: requested {requested}, available {available}")]
    InsufficientInventory {
        product_id: ProductId,
        requested: u32,
        available: u32,
    },

    /// No order with the given id.
    #[error("Order not found: {order_id}")]
    OrderNotFound { order_id: OrderId },

    /// No order item with the given id.
    #[error("Order item not found: {item_id}")]
    ItemNotFound { item_id: OrderItemId },

    /// Order is not in a status that allows the operation.
    #[error("Invalid order state: cannot {action} from {current_status} status")]
    InvalidState {
        current_status: OrderStatus,
        action: &'static str,
    },

    /// The refund credit failed, so the cancellation was aborted.
    #[error("Refund failed for order {order_id}: {reason}")]
    RefundFailed { order_id: OrderId, reason: String },

    /// Domain-level order error.
    #[error(transparent)]
    Order(#[from] OrderError),

    /// Transaction lifecycle error.
    #[error(transparent)]
    Transaction(#[from] TransactionError),

    /// Points ledger error.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Storage error.
    #[error(transparent)]
    Store(#[from] StoreError),
}
