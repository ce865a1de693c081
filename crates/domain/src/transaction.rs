//! Loyalty points transaction records.

use chrono::{DateTime, Utc};
use common::{CompanyId, OrderId, Points, TransactionId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum number of retries for a failed transaction.
pub const MAX_RETRIES: u32 = 3;

/// Errors from transaction lifecycle operations.
#[derive(Debug, Error)]
pub enum TransactionError {
    /// Transaction is not in the expected status.
    #[error("Invalid state transition: cannot {action} from {current_status} status")]
    InvalidStateTransition {
        current_status: TransactionStatus,
        action: &'static str,
    },

    /// Retry budget exhausted.
    #[error("Retries exhausted: {retry_count} of {MAX_RETRIES} used")]
    RetriesExhausted { retry_count: u32 },

    /// Points amount must be positive.
    #[error("Invalid points amount: {points} (must be greater than 0)")]
    InvalidPointsAmount { points: i64 },
}

/// Direction of a points movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionType {
    /// Points taken from the company's account to pay for an order.
    Debit,
    /// Points added to the company's account.
    Credit,
    /// Points returned for a cancelled order.
    Refund,
}

impl TransactionType {
    /// Returns the type name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Debit => "Debit",
            TransactionType::Credit => "Credit",
            TransactionType::Refund => "Refund",
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Status of a points transaction.
///
/// Status transitions:
/// ```text
/// Pending ──► Processing ──┬──► Completed ──► Refunded
///     ▲                    │
///     └──── (retry) ◄── Failed
/// ```
///
/// A refund is recorded as a *new* `Refund` transaction; the original debit
/// is additionally flagged `Refunded` so its points are not counted twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum TransactionStatus {
    /// Recorded but not yet sent to the points ledger.
    #[default]
    Pending,

    /// Ledger call in flight.
    Processing,

    /// Ledger accepted the movement.
    Completed,

    /// Ledger rejected the movement or the call failed.
    Failed,

    /// A completed debit that was later refunded (terminal).
    Refunded,
}

impl TransactionStatus {
    /// Returns true if processing can start.
    pub fn can_process(&self) -> bool {
        matches!(self, TransactionStatus::Pending)
    }

    /// Returns true if the transaction can complete.
    pub fn can_complete(&self) -> bool {
        matches!(self, TransactionStatus::Processing)
    }

    /// Returns true if the transaction can fail.
    pub fn can_fail(&self) -> bool {
        matches!(self, TransactionStatus::Processing)
    }

    /// Returns true if the transaction can be retried (subject to the
    /// retry budget).
    pub fn can_retry(&self) -> bool {
        matches!(self, TransactionStatus::Failed)
    }

    /// Returns true if the transaction can be flagged as refunded.
    pub fn can_refund(&self) -> bool {
        matches!(self, TransactionStatus::Completed)
    }

    /// Returns true if no further transitions are possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TransactionStatus::Refunded)
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "Pending",
            TransactionStatus::Processing => "Processing",
            TransactionStatus::Completed => "Completed",
            TransactionStatus::Failed => "Failed",
            TransactionStatus::Refunded => "Refunded",
        }
    }
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single points movement against the external ledger.
///
/// Completed transactions are immutable apart from the `Refunded` flag;
/// corrections are always recorded as new transactions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoyaltyTransaction {
    pub id: TransactionId,
    pub order_id: OrderId,
    pub company_id: CompanyId,
    pub transaction_type: TransactionType,
    pub points_amount: Points,
    /// Reference string sent to the ledger, e.g. `ORDER-LRP-...`.
    pub reference: String,
    /// Transaction id assigned by the ledger, set only on success.
    pub external_transaction_id: Option<String>,
    pub status: TransactionStatus,
    pub error_message: Option<String>,
    pub retry_count: u32,
    pub processed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl LoyaltyTransaction {
    /// Creates a new pending transaction.
    pub fn new(
        order_id: OrderId,
        company_id: CompanyId,
        transaction_type: TransactionType,
        points_amount: Points,
        reference: impl Into<String>,
    ) -> Result<Self, TransactionError> {
        if !points_amount.is_positive() {
            return Err(TransactionError::InvalidPointsAmount {
                points: points_amount.value(),
            });
        }
        Ok(Self {
            id: TransactionId::new(),
            order_id,
            company_id,
            transaction_type,
            points_amount,
            reference: reference.into(),
            external_transaction_id: None,
            status: TransactionStatus::Pending,
            error_message: None,
            retry_count: 0,
            processed_at: None,
            created_at: Utc::now(),
        })
    }

    /// Marks the ledger call as in flight.
    pub fn begin_processing(&mut self) -> Result<(), TransactionError> {
        if !self.status.can_process() {
            return Err(TransactionError::InvalidStateTransition {
                current_status: self.status,
                action: "begin processing",
            });
        }
        self.status = TransactionStatus::Processing;
        Ok(())
    }

    /// Records ledger acceptance with the ledger's transaction id.
    pub fn complete(&mut self, external_transaction_id: impl Into<String>) -> Result<(), TransactionError> {
        if !self.status.can_complete() {
            return Err(TransactionError::InvalidStateTransition {
                current_status: self.status,
                action: "complete",
            });
        }
        self.status = TransactionStatus::Completed;
        self.external_transaction_id = Some(external_transaction_id.into());
        self.error_message = None;
        self.processed_at = Some(Utc::now());
        Ok(())
    }

    /// Records a ledger rejection or call failure.
    pub fn fail(&mut self, error_message: impl Into<String>) -> Result<(), TransactionError> {
        if !self.status.can_fail() {
            return Err(TransactionError::InvalidStateTransition {
                current_status: self.status,
                action: "fail",
            });
        }
        self.status = TransactionStatus::Failed;
        self.error_message = Some(error_message.into());
        self.processed_at = Some(Utc::now());
        Ok(())
    }

    /// Starts another ledger attempt for a failed transaction.
    ///
    /// Consumes one unit of the retry budget and moves back to
    /// `Processing`.
    pub fn begin_retry(&mut self) -> Result<(), TransactionError> {
        if !self.status.can_retry() {
            return Err(TransactionError::InvalidStateTransition {
                current_status: self.status,
                action: "retry",
            });
        }
        if self.retry_count >= MAX_RETRIES {
            return Err(TransactionError::RetriesExhausted {
                retry_count: self.retry_count,
            });
        }
        self.retry_count += 1;
        self.status = TransactionStatus::Processing;
        Ok(())
    }

    /// Flags a completed debit as refunded.
    pub fn mark_refunded(&mut self) -> Result<(), TransactionError> {
        if !self.status.can_refund() {
            return Err(TransactionError::InvalidStateTransition {
                current_status: self.status,
                action: "mark refunded",
            });
        }
        self.status = TransactionStatus::Refunded;
        Ok(())
    }

    /// Returns true if the transaction failed with retry budget remaining.
    pub fn is_retryable(&self) -> bool {
        self.status.can_retry() && self.retry_count < MAX_RETRIES
    }

    /// Returns the reference to use for the current retry attempt.
    pub fn retry_reference(&self) -> String {
        format!("{}-RETRY-{}", self.reference, self.retry_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transaction() -> LoyaltyTransaction {
        LoyaltyTransaction::new(
            OrderId::new(),
            CompanyId::new(),
            TransactionType::Debit,
            Points::new(500),
            "ORDER-LRP-123",
        )
        .unwrap()
    }

    #[test]
    fn test_new_transaction_is_pending() {
        let txn = transaction();
        assert_eq!(txn.status, TransactionStatus::Pending);
        assert_eq!(txn.retry_count, 0);
        assert!(txn.external_transaction_id.is_none());
        assert!(txn.processed_at.is_none());
    }

    #[test]
    fn test_zero_points_rejected() {
        let result = LoyaltyTransaction::new(
            OrderId::new(),
            CompanyId::new(),
            TransactionType::Debit,
            Points::zero(),
            "ORDER-LRP-123",
        );
        assert!(matches!(
            result,
            Err(TransactionError::InvalidPointsAmount { points: 0 })
        ));
    }

    #[test]
    fn test_happy_path_to_completed() {
        let mut txn = transaction();
        txn.begin_processing().unwrap();
        txn.complete("TXN-ABCD1234").unwrap();

        assert_eq!(txn.status, TransactionStatus::Completed);
        assert_eq!(txn.external_transaction_id.as_deref(), Some("TXN-ABCD1234"));
        assert!(txn.processed_at.is_some());
    }

    #[test]
    fn test_cannot_complete_from_pending() {
        let mut txn = transaction();
        let err = txn.complete("TXN-ABCD1234").unwrap_err();
        assert!(matches!(
            err,
            TransactionError::InvalidStateTransition {
                current_status: TransactionStatus::Pending,
                ..
            }
        ));
    }

    #[test]
    fn test_failure_records_error() {
        let mut txn = transaction();
        txn.begin_processing().unwrap();
        txn.fail("INSUFFICIENT_BALANCE").unwrap();

        assert_eq!(txn.status, TransactionStatus::Failed);
        assert_eq!(txn.error_message.as_deref(), Some("INSUFFICIENT_BALANCE"));
        assert!(txn.is_retryable());
    }

    #[test]
    fn test_retry_consumes_budget() {
        let mut txn = transaction();
        txn.begin_processing().unwrap();
        txn.fail("timeout").unwrap();

        txn.begin_retry().unwrap();
        assert_eq!(txn.status, TransactionStatus::Processing);
        assert_eq!(txn.retry_count, 1);
        assert_eq!(txn.retry_reference(), "ORDER-LRP-123-RETRY-1");
    }

    #[test]
    fn test_retry_budget_exhausted() {
        let mut txn = transaction();
        txn.begin_processing().unwrap();
        txn.fail("timeout").unwrap();

        for _ in 0..MAX_RETRIES {
            txn.begin_retry().unwrap();
            txn.fail("timeout").unwrap();
        }

        assert!(!txn.is_retryable());
        let err = txn.begin_retry().unwrap_err();
        assert!(matches!(
            err,
            TransactionError::RetriesExhausted { retry_count: 3 }
        ));
    }

    #[test]
    fn test_refund_only_from_completed() {
        let mut txn = transaction();
        assert!(txn.mark_refunded().is_err());

        txn.begin_processing().unwrap();
        txn.complete("TXN-ABCD1234").unwrap();
        txn.mark_refunded().unwrap();

        assert_eq!(txn.status, TransactionStatus::Refunded);
        assert!(txn.status.is_terminal());
    }

    #[test]
    fn test_status_display() {
        assert_eq!(TransactionStatus::Pending.to_string(), "Pending");
        assert_eq!(TransactionStatus::Processing.to_string(), "Processing");
        assert_eq!(TransactionStatus::Completed.to_string(), "Completed");
        assert_eq!(TransactionStatus::Failed.to_string(), "Failed");
        assert_eq!(TransactionStatus::Refunded.to_string(), "Refunded");
    }

    #[test]
    fn test_type_display() {
        assert_eq!(TransactionType::Debit.to_string(), "Debit");
        assert_eq!(TransactionType::Credit.to_string(), "Credit");
        assert_eq!(TransactionType::Refund.to_string(), "Refund");
    }
}
