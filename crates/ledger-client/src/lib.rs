//! Client for the external loyalty points ledger.
//!
//! The `PointsLedger` trait is the only thing the rest of the system sees;
//! `HttpPointsLedger` talks to the real service with bounded timeouts and
//! exponential-backoff retries, and `SimulatedPointsLedger` is a
//! deterministic stand-in for tests and local runs.

pub mod client;
pub mod error;
pub mod http;
pub mod retry;
pub mod simulated;

pub use client::{Balance, LedgerReceipt, PointsLedger};
pub use error::LedgerError;
pub use http::{HttpPointsLedger, LedgerConfig};
pub use retry::{RetryPolicy, retry_with_policy};
pub use simulated::SimulatedPointsLedger;
