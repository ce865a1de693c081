//! HTTP route handlers.

pub mod companies;
pub mod health;
pub mod inventory;
pub mod metrics;
pub mod orders;
