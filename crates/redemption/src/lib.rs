//! Redemption order orchestration.
//!
//! This crate ties the platform together:
//! - `RedemptionOrchestrator` drives the order lifecycle: validate and
//!   create, debit points and start fulfillment, cancel with compensation.
//! - `OrderWorkflowEngine` moves individual items through fulfillment and
//!   completes the order once every item has reached its customer.
//! - `TransactionJournal` records every points movement and retries failed
//!   ones within a bounded budget.
//!
//! If a step fails partway, previously taken actions are compensated:
//! a failed debit releases inventory reservations, a cancellation refunds
//! a completed debit before anything else happens.

pub mod error;
pub mod journal;
pub mod orchestrator;
pub mod services;
pub mod workflow;

pub use error::RedemptionError;
pub use journal::TransactionJournal;
pub use orchestrator::{CreateOrderRequest, OrderLine, RedemptionOrchestrator};
pub use services::{
    FulfillmentError, FulfillmentReceipt, InMemoryVirtualFulfillment, LoggingNotifications,
    NotificationEvent, NotificationSink, RecordingNotifications, VirtualFulfillment,
};
pub use workflow::OrderWorkflowEngine;
