//! Deterministic in-process ledger for tests and local runs.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::Points;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::client::{Balance, LedgerReceipt, PointsLedger};
use crate::error::LedgerError;

/// Balance granted to accounts the simulator has never seen.
const DEFAULT_BALANCE: i64 = 50_000;

#[derive(Debug)]
struct State {
    balances: HashMap<String, i64>,
    fail_debits: u32,
    fail_credits: u32,
    healthy: bool,
    debit_count: u32,
    credit_count: u32,
}

impl Default for State {
    fn default() -> Self {
        // Fixture accounts used throughout the test suites.
        let balances = HashMap::from([
            ("ACME001".to_string(), 150_000),
            ("GLOBAL002".to_string(), 75_000),
            ("TECH003".to_string(), 200_000),
            ("STARTUP004".to_string(), 25_000),
        ]);
        Self {
            balances,
            fail_debits: 0,
            fail_credits: 0,
            healthy: true,
            debit_count: 0,
            credit_count: 0,
        }
    }
}

/// Simulated points ledger.
///
/// Behaves like the real service behind the same trait: debits reject with
/// `INSUFFICIENT_BALANCE` when the account is short, and the `fail_next_*`
/// knobs inject transient failures for retry and compensation tests.
#[derive(Debug, Clone, Default)]
pub struct SimulatedPointsLedger {
    state: Arc<RwLock<State>>,
}

impl SimulatedPointsLedger {
    /// Creates a simulator with the fixture balances.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets an account's balance directly.
    pub async fn set_balance(&self, account_id: &str, balance: Points) {
        let mut state = self.state.write().await;
        state.balances.insert(account_id.to_string(), balance.value());
    }

    /// Makes the next `count` debit calls fail with a transient error.
    pub async fn fail_next_debits(&self, count: u32) {
        self.state.write().await.fail_debits = count;
    }

    /// Makes the next `count` credit calls fail with a transient error.
    pub async fn fail_next_credits(&self, count: u32) {
        self.state.write().await.fail_credits = count;
    }

    /// Controls what `health_check` reports.
    pub async fn set_healthy(&self, healthy: bool) {
        self.state.write().await.healthy = healthy;
    }

    /// Returns how many debit calls have been accepted or rejected.
    pub async fn debit_count(&self) -> u32 {
        self.state.read().await.debit_count
    }

    /// Returns how many credit calls have been accepted or rejected.
    pub async fn credit_count(&self) -> u32 {
        self.state.read().await.credit_count
    }

    fn next_transaction_id() -> String {
        let id = Uuid::new_v4().simple().to_string()[..8].to_uppercase();
        format!("TXN-{id}")
    }
}

#[async_trait]
impl PointsLedger for SimulatedPointsLedger {
    async fn get_balance(&self, account_id: &str) -> Result<Balance, LedgerError> {
        let mut state = self.state.write().await;
        let balance = *state
            .balances
            .entry(account_id.to_string())
            .or_insert(DEFAULT_BALANCE);
        Ok(Balance {
            account_id: account_id.to_string(),
            balance: Points::new(balance),
        })
    }

    async fn debit(
        &self,
        account_id: &str,
        points: Points,
        _reference: &str,
    ) -> Result<LedgerReceipt, LedgerError> {
        let mut state = self.state.write().await;
        state.debit_count += 1;

        if state.fail_debits > 0 {
            state.fail_debits -= 1;
            return Err(LedgerError::Unavailable("simulated outage".to_string()));
        }

        let balance = state
            .balances
            .entry(account_id.to_string())
            .or_insert(DEFAULT_BALANCE);

        if *balance < points.value() {
            return Err(LedgerError::Rejected {
                code: "INSUFFICIENT_BALANCE".to_string(),
                message: format!(
                    "Account {account_id} has {} points, {} requested",
                    *balance,
                    points.value()
                ),
            });
        }

        *balance -= points.value();
        Ok(LedgerReceipt {
            transaction_id: Self::next_transaction_id(),
            balance_after: Some(Points::new(*balance)),
        })
    }

    async fn credit(
        &self,
        account_id: &str,
        points: Points,
        _reference: &str,
    ) -> Result<LedgerReceipt, LedgerError> {
        let mut state = self.state.write().await;
        state.credit_count += 1;

        if state.fail_credits > 0 {
            state.fail_credits -= 1;
            return Err(LedgerError::Unavailable("simulated outage".to_string()));
        }

        let balance = state
            .balances
            .entry(account_id.to_string())
            .or_insert(DEFAULT_BALANCE);
        *balance += points.value();

        Ok(LedgerReceipt {
            transaction_id: Self::next_transaction_id(),
            balance_after: Some(Points::new(*balance)),
        })
    }

    async fn health_check(&self) -> bool {
        self.state.read().await.healthy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fixture_balances() {
        let ledger = SimulatedPointsLedger::new();
        let balance = ledger.get_balance("ACME001").await.unwrap();
        assert_eq!(balance.balance, Points::new(150_000));
    }

    #[tokio::test]
    async fn test_unknown_account_gets_default_balance() {
        let ledger = SimulatedPointsLedger::new();
        let balance = ledger.get_balance("NEWCO999").await.unwrap();
        assert_eq!(balance.balance, Points::new(50_000));
    }

    #[tokio::test]
    async fn test_debit_and_credit_move_balance() {
        let ledger = SimulatedPointsLedger::new();

        let receipt = ledger
            .debit("ACME001", Points::new(10_000), "ORDER-LRP-1")
            .await
            .unwrap();
        assert!(receipt.transaction_id.starts_with("TXN-"));
        assert_eq!(receipt.balance_after, Some(Points::new(140_000)));

        let receipt = ledger
            .credit("ACME001", Points::new(10_000), "REFUND-LRP-1")
            .await
            .unwrap();
        assert_eq!(receipt.balance_after, Some(Points::new(150_000)));

        assert_eq!(ledger.debit_count().await, 1);
        assert_eq!(ledger.credit_count().await, 1);
    }

    #[tokio::test]
    async fn test_insufficient_balance_rejected() {
        let ledger = SimulatedPointsLedger::new();
        let err = ledger
            .debit("STARTUP004", Points::new(30_000), "ORDER-LRP-2")
            .await
            .unwrap_err();

        assert_eq!(err.rejection_code(), Some("INSUFFICIENT_BALANCE"));
        assert!(!err.is_transient());

        // Balance unchanged after a rejection
        let balance = ledger.get_balance("STARTUP004").await.unwrap();
        assert_eq!(balance.balance, Points::new(25_000));
    }

    #[tokio::test]
    async fn test_fail_next_debits_injects_transient_errors() {
        let ledger = SimulatedPointsLedger::new();
        ledger.fail_next_debits(2).await;

        for _ in 0..2 {
            let err = ledger
                .debit("ACME001", Points::new(100), "ORDER-LRP-3")
                .await
                .unwrap_err();
            assert!(err.is_transient());
        }

        // Third call goes through
        assert!(
            ledger
                .debit("ACME001", Points::new(100), "ORDER-LRP-3-RETRY-1")
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_health_knob() {
        let ledger = SimulatedPointsLedger::new();
        assert!(ledger.health_check().await);
        ledger.set_healthy(false).await;
        assert!(!ledger.health_check().await);
    }
}
