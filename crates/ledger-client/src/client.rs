//! Points ledger trait and result types.

use async_trait::async_trait;
use common::Points;
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;

/// An account's current points balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    pub account_id: String,
    pub balance: Points,
}

/// Acknowledgement of an accepted debit or credit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerReceipt {
    /// Transaction id assigned by the ledger, e.g. `TXN-1A2B3C4D`.
    pub transaction_id: String,
    /// Balance after the movement, when the ledger reports it.
    pub balance_after: Option<Points>,
}

/// Boundary to the external loyalty points ledger.
///
/// Implementations must be thread-safe; the orchestrator calls them
/// concurrently for different orders.
#[async_trait]
pub trait PointsLedger: Send + Sync {
    /// Returns the current balance for a loyalty account.
    async fn get_balance(&self, account_id: &str) -> Result<Balance, LedgerError>;

    /// Takes points from an account. The reference ties the movement back
    /// to an order and must be unique per attempt.
    async fn debit(
        &self,
        account_id: &str,
        points: Points,
        reference: &str,
    ) -> Result<LedgerReceipt, LedgerError>;

    /// Returns points to an account.
    async fn credit(
        &self,
        account_id: &str,
        points: Points,
        reference: &str,
    ) -> Result<LedgerReceipt, LedgerError>;

    /// Returns true if the ledger is reachable and serving.
    async fn health_check(&self) -> bool;
}
