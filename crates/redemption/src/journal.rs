//! Transaction journal.
//!
//! Every points movement against the external ledger is recorded here,
//! whether it succeeded or not. Failed movements keep a bounded retry
//! budget and can be driven to completion later by a background sweep.

use common::{OrderId, TransactionId};
use domain::{LoyaltyTransaction, RedemptionOrder, TransactionType};
use ledger_client::PointsLedger;
use store::{Catalog, StoreError, TransactionStore};

use crate::error::RedemptionError;

/// Records points movements and retries failed ones.
#[derive(Debug, Clone)]
pub struct TransactionJournal<S, L> {
    store: S,
    ledger: L,
}

impl<S, L> TransactionJournal<S, L>
where
    S: TransactionStore + Catalog + Clone,
    L: PointsLedger + Clone,
{
    /// Creates a journal over the given store and ledger.
    pub fn new(store: S, ledger: L) -> Self {
        Self { store, ledger }
    }

    /// Records a movement the ledger accepted.
    pub async fn record_completed(
        &self,
        order: &RedemptionOrder,
        transaction_type: TransactionType,
        reference: &str,
        external_transaction_id: &str,
    ) -> Result<LoyaltyTransaction, RedemptionError> {
        let mut transaction = LoyaltyTransaction::new(
            order.id,
            order.company_id,
            transaction_type,
            order.total_points,
            reference,
        )?;
        transaction.begin_processing()?;
        transaction.complete(external_transaction_id)?;
        self.store.insert(&transaction).await?;
        Ok(transaction)
    }

    /// Records a movement the ledger rejected or that never reached it.
    pub async fn record_failed(
        &self,
        order: &RedemptionOrder,
        transaction_type: TransactionType,
        reference: &str,
        error_message: &str,
    ) -> Result<LoyaltyTransaction, RedemptionError> {
        let mut transaction = LoyaltyTransaction::new(
            order.id,
            order.company_id,
            transaction_type,
            order.total_points,
            reference,
        )?;
        transaction.begin_processing()?;
        transaction.fail(error_message)?;
        self.store.insert(&transaction).await?;
        Ok(transaction)
    }

    /// Returns all recorded movements for an order, oldest first.
    pub async fn transactions_for_order(
        &self,
        order_id: OrderId,
    ) -> Result<Vec<LoyaltyTransaction>, RedemptionError> {
        Ok(self.store.for_order(order_id).await?)
    }

    /// Returns failed movements with retry budget remaining.
    pub async fn retryable(&self) -> Result<Vec<LoyaltyTransaction>, RedemptionError> {
        Ok(self.store.retryable().await?)
    }

    /// Retries a failed movement against the ledger.
    ///
    /// Consumes one unit of the retry budget. The returned transaction is
    /// `Completed` if the ledger accepted this attempt and `Failed` again
    /// otherwise; a transaction out of budget is an error.
    #[tracing::instrument(skip(self))]
    pub async fn retry(
        &self,
        transaction_id: TransactionId,
    ) -> Result<LoyaltyTransaction, RedemptionError> {
        let mut transaction = self
            .store
            .get_transaction(transaction_id)
            .await?
            .ok_or(StoreError::TransactionNotFound { transaction_id })?;

        let company = self
            .store
            .get_company(transaction.company_id)
            .await?
            .ok_or(RedemptionError::CompanyNotFound {
                company_id: transaction.company_id,
            })?;
        let account_id =
            company
                .loyalty_account_id
                .ok_or(RedemptionError::NoLoyaltyAccount {
                    company_id: transaction.company_id,
                })?;

        transaction.begin_retry()?;
        self.store.update(&transaction).await?;

        let reference = transaction.retry_reference();
        let result = match transaction.transaction_type {
            TransactionType::Debit => {
                self.ledger
                    .debit(&account_id, transaction.points_amount, &reference)
                    .await
            }
            TransactionType::Credit | TransactionType::Refund => {
                self.ledger
                    .credit(&account_id, transaction.points_amount, &reference)
                    .await
            }
        };

        match result {
            Ok(receipt) => {
                transaction.complete(receipt.transaction_id)?;
                tracing::info!(
                    transaction_id = %transaction.id,
                    retry_count = transaction.retry_count,
                    "Transaction retry succeeded"
                );
            }
            Err(err) => {
                transaction.fail(err.to_string())?;
                tracing::warn!(
                    transaction_id = %transaction.id,
                    retry_count = transaction.retry_count,
                    error = %err,
                    "Transaction retry failed"
                );
            }
        }

        self.store.update(&transaction).await?;
        Ok(transaction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{AccountManagerId, Points};
    use domain::{Company, TransactionStatus, MAX_RETRIES};
    use ledger_client::SimulatedPointsLedger;
    use store::InMemoryStore;

    async fn setup() -> (
        TransactionJournal<InMemoryStore, SimulatedPointsLedger>,
        InMemoryStore,
        SimulatedPointsLedger,
        RedemptionOrder,
    ) {
        let store = InMemoryStore::new();
        let ledger = SimulatedPointsLedger::new();

        let company = Company::new("Acme Corp", "ACME001");
        store.upsert_company(&company).await.unwrap();

        let order = RedemptionOrder::new(
            company.id,
            AccountManagerId::new(),
            Points::new(5_000),
            None,
            None,
        )
        .unwrap();

        let journal = TransactionJournal::new(store.clone(), ledger.clone());
        (journal, store, ledger, order)
    }

    #[tokio::test]
    async fn test_record_completed_persists() {
        let (journal, store, _ledger, order) = setup().await;

        let txn = journal
            .record_completed(
                &order,
                TransactionType::Debit,
                &format!("ORDER-{}", order.order_number),
                "TXN-ABCD1234",
            )
            .await
            .unwrap();

        assert_eq!(txn.status, TransactionStatus::Completed);
        assert_eq!(txn.external_transaction_id.as_deref(), Some("TXN-ABCD1234"));

        let stored = store.get_transaction(txn.id).await.unwrap().unwrap();
        assert_eq!(stored, txn);
    }

    #[tokio::test]
    async fn test_record_failed_is_retryable() {
        let (journal, _store, _ledger, order) = setup().await;

        let txn = journal
            .record_failed(
                &order,
                TransactionType::Debit,
                &format!("ORDER-{}", order.order_number),
                "INSUFFICIENT_BALANCE",
            )
            .await
            .unwrap();

        assert_eq!(txn.status, TransactionStatus::Failed);
        assert_eq!(txn.error_message.as_deref(), Some("INSUFFICIENT_BALANCE"));

        let retryable = journal.retryable().await.unwrap();
        assert_eq!(retryable.len(), 1);
        assert_eq!(retryable[0].id, txn.id);
    }

    #[tokio::test]
    async fn test_retry_completes_on_ledger_success() {
        let (journal, _store, ledger, order) = setup().await;

        let txn = journal
            .record_failed(
                &order,
                TransactionType::Debit,
                &format!("ORDER-{}", order.order_number),
                "simulated outage",
            )
            .await
            .unwrap();

        let retried = journal.retry(txn.id).await.unwrap();
        assert_eq!(retried.status, TransactionStatus::Completed);
        assert_eq!(retried.retry_count, 1);
        assert!(retried.external_transaction_id.is_some());

        // Debit actually hit the ledger
        let balance = ledger.get_balance("ACME001").await.unwrap();
        assert_eq!(balance.balance, Points::new(145_000));
    }

    #[tokio::test]
    async fn test_retry_refund_credits_account() {
        let (journal, _store, ledger, order) = setup().await;

        let txn = journal
            .record_failed(
                &order,
                TransactionType::Refund,
                &format!("REFUND-{}", order.order_number),
                "simulated outage",
            )
            .await
            .unwrap();

        let retried = journal.retry(txn.id).await.unwrap();
        assert_eq!(retried.status, TransactionStatus::Completed);

        let balance = ledger.get_balance("ACME001").await.unwrap();
        assert_eq!(balance.balance, Points::new(155_000));
    }

    #[tokio::test]
    async fn test_retry_budget_exhausts() {
        let (journal, _store, ledger, order) = setup().await;

        let txn = journal
            .record_failed(
                &order,
                TransactionType::Debit,
                &format!("ORDER-{}", order.order_number),
                "simulated outage",
            )
            .await
            .unwrap();

        ledger.fail_next_debits(MAX_RETRIES).await;
        for attempt in 1..=MAX_RETRIES {
            let retried = journal.retry(txn.id).await.unwrap();
            assert_eq!(retried.status, TransactionStatus::Failed);
            assert_eq!(retried.retry_count, attempt);
        }

        let err = journal.retry(txn.id).await.unwrap_err();
        assert!(matches!(
            err,
            RedemptionError::Transaction(domain::TransactionError::RetriesExhausted { .. })
        ));
        assert!(journal.retryable().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_retry_unknown_transaction() {
        let (journal, _store, _ledger, _order) = setup().await;
        let err = journal.retry(TransactionId::new()).await.unwrap_err();
        assert!(matches!(
            err,
            RedemptionError::Store(StoreError::TransactionNotFound { .. })
        ));
    }
}
