//! Shared value types for the loyalty redemption platform.
//!
//! Provides the uuid-backed identifier newtypes used across crates and the
//! `Points` amount type.

mod ids;
mod points;

pub use ids::{AccountManagerId, CompanyId, OrderId, OrderItemId, ProductId, TransactionId};
pub use points::Points;
