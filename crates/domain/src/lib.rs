//! Domain layer for the loyalty redemption platform.
//!
//! This crate provides the core entities and their state machines:
//! - `RedemptionOrder` and its `OrderItem` line items
//! - `LoyaltyTransaction` records for every points movement
//! - `Inventory` stock arithmetic for physical products
//! - Catalog entities (`Product`, `Company`, `AccountManager`)
//!
//! Every state transition is a method that checks its precondition and
//! returns an `InvalidStateTransition` error instead of silently clamping.

pub mod catalog;
pub mod inventory;
pub mod order;
pub mod transaction;

pub use catalog::{AccountManager, Company, Product, ProductType};
pub use inventory::{Inventory, InventoryError};
pub use order::{FulfillmentStatus, OrderError, OrderItem, OrderStatus, RedemptionOrder};
pub use transaction::{
    LoyaltyTransaction, TransactionError, TransactionStatus, TransactionType, MAX_RETRIES,
};
