//! Order orchestration.
//!
//! `RedemptionOrchestrator` owns the three order-level use cases:
//!
//! - `create_order` validates everything up front, then reserves inventory
//!   and persists the order. Nothing is charged yet.
//! - `process_order` debits the points and hands the order to the
//!   fulfillment workflow. A failed debit releases the reservations and
//!   fails the order.
//! - `cancel_order` refunds a processed order before touching anything
//!   else; if the refund fails, the cancellation is aborted and the order
//!   is left exactly as it was.

use common::{AccountManagerId, CompanyId, OrderId, Points, ProductId};
use domain::{
    Company, FulfillmentStatus, InventoryError, OrderError, OrderItem, OrderStatus,
    RedemptionOrder, TransactionStatus, TransactionType,
};
use ledger_client::{Balance, PointsLedger};
use serde::{Deserialize, Serialize};
use store::{Catalog, InventoryLedger, OrderStore, StoreError, TransactionStore};

use crate::error::RedemptionError;
use crate::journal::TransactionJournal;
use crate::services::{NotificationEvent, NotificationSink, VirtualFulfillment};
use crate::workflow::OrderWorkflowEngine;

/// One requested line of a new order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Request to create a redemption order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    pub company_id: CompanyId,
    pub account_manager_id: AccountManagerId,
    pub lines: Vec<OrderLine>,
    pub shipping_address: Option<String>,
    pub special_instructions: Option<String>,
}

/// Drives redemption orders through their lifecycle.
#[derive(Debug, Clone)]
pub struct RedemptionOrchestrator<S, L, F, N> {
    store: S,
    ledger: L,
    notifications: N,
    journal: TransactionJournal<S, L>,
    workflow: OrderWorkflowEngine<S, F, N>,
}

impl<S, L, F, N> RedemptionOrchestrator<S, L, F, N>
where
    S: OrderStore + InventoryLedger + TransactionStore + Catalog + Clone,
    L: PointsLedger + Clone,
    F: VirtualFulfillment + Clone,
    N: NotificationSink + Clone,
{
    /// Creates an orchestrator over the given store and collaborators.
    pub fn new(store: S, ledger: L, fulfillment: F, notifications: N) -> Self {
        let journal = TransactionJournal::new(store.clone(), ledger.clone());
        let workflow =
            OrderWorkflowEngine::new(store.clone(), fulfillment, notifications.clone());
        Self {
            store,
            ledger,
            notifications,
            journal,
            workflow,
        }
    }

    /// The fulfillment workflow engine for item-level operations.
    pub fn workflow(&self) -> &OrderWorkflowEngine<S, F, N> {
        &self.workflow
    }

    /// The transaction journal for inspection and retries.
    pub fn journal(&self) -> &TransactionJournal<S, L> {
        &self.journal
    }

    /// Returns a company's current points balance from the ledger.
    #[tracing::instrument(skip(self))]
    pub async fn check_balance(&self, company_id: CompanyId) -> Result<Balance, RedemptionError> {
        let company = self.active_company(company_id).await?;
        let account_id = loyalty_account(&company)?;
        Ok(self.ledger.get_balance(&account_id).await?)
    }

    /// Validates and creates a new order.
    ///
    /// Validation happens before any state changes: company, account
    /// manager, and every product are checked, and physical availability is
    /// verified, before the first reservation is taken. Points are not
    /// debited here.
    #[tracing::instrument(skip(self, request), fields(company_id = %request.company_id))]
    pub async fn create_order(
        &self,
        request: CreateOrderRequest,
    ) -> Result<RedemptionOrder, RedemptionError> {
        if request.lines.is_empty() {
            return Err(RedemptionError::EmptyOrder);
        }

        let company = self.active_company(request.company_id).await?;
        loyalty_account(&company)?;

        let manager = self
            .store
            .get_account_manager(request.account_manager_id)
            .await?
            .ok_or(RedemptionError::AccountManagerNotFound {
                manager_id: request.account_manager_id,
            })?;
        if !manager.is_active {
            return Err(RedemptionError::AccountManagerInactive {
                manager_id: manager.id,
            });
        }
        if manager.company_id != company.id {
            return Err(RedemptionError::AccountManagerMismatch {
                manager_id: manager.id,
                company_id: company.id,
            });
        }

        // Resolve every product and check stock before touching anything.
        let mut products = Vec::with_capacity(request.lines.len());
        for line in &request.lines {
            let product = self
                .store
                .get_product(line.product_id)
                .await?
                .ok_or(RedemptionError::ProductNotFound {
                    product_id: line.product_id,
                })?;
            if !product.is_active {
                return Err(RedemptionError::ProductInactive {
                    product_id: product.id,
                });
            }
            if product.product_type.requires_inventory()
                && !self.store.check_availability(product.id, line.quantity).await?
            {
                let available = self
                    .store
                    .get_inventory(product.id)
                    .await?
                    .map(|inv| inv.quantity_available)
                    .unwrap_or(0);
                return Err(RedemptionError::InsufficientInventory {
                    product_id: product.id,
                    requested: line.quantity,
                    available,
                });
            }
            products.push(product);
        }

        // Snapshot costs into the order and its items.
        let mut total = Points::zero();
        for (line, product) in request.lines.iter().zip(&products) {
            if line.quantity == 0 {
                return Err(RedemptionError::Order(OrderError::InvalidQuantity {
                    quantity: 0,
                }));
            }
            total += product.points_cost.multiply(line.quantity);
        }

        let order = RedemptionOrder::new(
            company.id,
            manager.id,
            total,
            request.shipping_address,
            request.special_instructions,
        )?;

        let mut items = Vec::with_capacity(request.lines.len());
        for (line, product) in request.lines.iter().zip(&products) {
            items.push(OrderItem::new(
                order.id,
                product.id,
                product.sku.clone(),
                product.product_type,
                line.quantity,
                product.points_cost,
            )?);
        }

        // Commit phase: take the reservations, rolling back on any failure.
        let mut reserved: Vec<(ProductId, u32)> = Vec::new();
        for item in items.iter().filter(|i| i.product_type.requires_inventory()) {
            if let Err(err) = self.store.reserve(item.product_id, item.quantity).await {
                self.release_all(&reserved).await;
                return Err(map_reserve_error(err, item.product_id, item.quantity));
            }
            reserved.push((item.product_id, item.quantity));
        }

        if let Err(err) = self.store.insert_order(&order, &items).await {
            self.release_all(&reserved).await;
            return Err(err.into());
        }

        metrics::counter!("redemption_orders_created_total").increment(1);
        tracing::info!(
            order_id = %order.id,
            order_number = %order.order_number,
            total_points = %order.total_points,
            "Order created"
        );
        Ok(order)
    }

    /// Debits the order's points and starts fulfillment.
    ///
    /// On a successful debit the order moves to `Processing` and every item
    /// starts fulfillment. A rejected or failed debit is journaled, the
    /// inventory reservations are released, and the order is failed.
    #[tracing::instrument(skip(self))]
    pub async fn process_order(&self, order_id: OrderId) -> Result<RedemptionOrder, RedemptionError> {
        let mut order = self.load_order(order_id).await?;
        if !order.status.can_process() {
            return Err(RedemptionError::InvalidState {
                current_status: order.status,
                action: "process",
            });
        }

        let company = self.active_company(order.company_id).await?;
        let account_id = loyalty_account(&company)?;
        let reference = format!("ORDER-{}", order.order_number);

        match self
            .ledger
            .debit(&account_id, order.total_points, &reference)
            .await
        {
            Ok(receipt) => {
                self.journal
                    .record_completed(
                        &order,
                        TransactionType::Debit,
                        &reference,
                        &receipt.transaction_id,
                    )
                    .await?;

                order.begin_processing()?;
                self.store.update_order(&order).await?;

                metrics::counter!("redemption_orders_processed_total").increment(1);
                self.workflow.initiate_fulfillment(order.id).await?;

                // Fulfillment may already have completed a virtual-only order.
                self.load_order(order.id).await
            }
            Err(err) => {
                self.journal
                    .record_failed(&order, TransactionType::Debit, &reference, &err.to_string())
                    .await?;

                let items = self.store.items_for_order(order.id).await?;
                let reserved: Vec<(ProductId, u32)> = items
                    .iter()
                    .filter(|i| i.product_type.requires_inventory())
                    .map(|i| (i.product_id, i.quantity))
                    .collect();
                self.release_all(&reserved).await;

                order.fail()?;
                self.store.update_order(&order).await?;

                metrics::counter!("redemption_orders_failed_total").increment(1);
                tracing::warn!(
                    order_id = %order.id,
                    order_number = %order.order_number,
                    error = %err,
                    "Points debit failed, order failed"
                );
                Err(err.into())
            }
        }
    }

    /// Cancels an order, refunding its points if they were already debited.
    ///
    /// The refund happens first: if the ledger rejects it, the cancellation
    /// is aborted with `RefundFailed` and the order keeps its status.
    /// Reservations of items that never started fulfillment are released;
    /// stock consumed when fulfillment began stays consumed.
    #[tracing::instrument(skip(self))]
    pub async fn cancel_order(
        &self,
        order_id: OrderId,
        reason: &str,
    ) -> Result<RedemptionOrder, RedemptionError> {
        let mut order = self.load_order(order_id).await?;
        if !order.status.can_cancel() {
            return Err(RedemptionError::InvalidState {
                current_status: order.status,
                action: "cancel",
            });
        }

        if order.status == OrderStatus::Processing {
            let company = self.active_company(order.company_id).await?;
            let account_id = loyalty_account(&company)?;
            let reference = format!("REFUND-{}", order.order_number);

            let receipt = self
                .ledger
                .credit(&account_id, order.total_points, &reference)
                .await
                .map_err(|err| RedemptionError::RefundFailed {
                    order_id: order.id,
                    reason: err.to_string(),
                })?;

            self.journal
                .record_completed(
                    &order,
                    TransactionType::Refund,
                    &reference,
                    &receipt.transaction_id,
                )
                .await?;

            // Flag the original debit so its points are not counted twice.
            for mut txn in self.journal.transactions_for_order(order.id).await? {
                if txn.transaction_type == TransactionType::Debit
                    && txn.status == TransactionStatus::Completed
                {
                    txn.mark_refunded()?;
                    self.store.update(&txn).await?;
                }
            }
        }

        // Only items that never started fulfillment still hold a
        // reservation; items past Pending had their stock confirmed.
        let items = self.store.items_for_order(order.id).await?;
        let reserved: Vec<(ProductId, u32)> = items
            .iter()
            .filter(|i| {
                i.product_type.requires_inventory()
                    && i.fulfillment_status == FulfillmentStatus::Pending
            })
            .map(|i| (i.product_id, i.quantity))
            .collect();
        self.release_all(&reserved).await;

        order.cancel(reason)?;
        self.store.update_order(&order).await?;

        metrics::counter!("redemption_orders_cancelled_total").increment(1);
        tracing::info!(
            order_id = %order.id,
            order_number = %order.order_number,
            reason,
            "Order cancelled"
        );
        self.notifications
            .notify(NotificationEvent::OrderCancelled {
                order_id: order.id,
                order_number: order.order_number.clone(),
                reason: reason.to_string(),
            })
            .await;

        Ok(order)
    }

    async fn load_order(&self, order_id: OrderId) -> Result<RedemptionOrder, RedemptionError> {
        self.store
            .get_order(order_id)
            .await?
            .ok_or(RedemptionError::OrderNotFound { order_id })
    }

    async fn active_company(&self, company_id: CompanyId) -> Result<Company, RedemptionError> {
        let company = self
            .store
            .get_company(company_id)
            .await?
            .ok_or(RedemptionError::CompanyNotFound { company_id })?;
        if !company.is_active {
            return Err(RedemptionError::CompanyInactive { company_id });
        }
        Ok(company)
    }

    /// Best-effort release of a batch of reservations during rollback.
    async fn release_all(&self, reserved: &[(ProductId, u32)]) {
        for (product_id, quantity) in reserved {
            if let Err(err) = self.store.release(*product_id, *quantity).await {
                tracing::error!(
                    %product_id,
                    quantity,
                    error = %err,
                    "Failed to release reservation during rollback"
                );
            }
        }
    }
}

fn loyalty_account(company: &Company) -> Result<String, RedemptionError> {
    company
        .loyalty_account_id
        .clone()
        .ok_or(RedemptionError::NoLoyaltyAccount {
            company_id: company.id,
        })
}

fn map_reserve_error(err: StoreError, product_id: ProductId, requested: u32) -> RedemptionError {
    match err {
        StoreError::Inventory(InventoryError::InsufficientStock { available, .. }) => {
            RedemptionError::InsufficientInventory {
                product_id,
                requested,
                available,
            }
        }
        other => other.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{InMemoryVirtualFulfillment, RecordingNotifications};
    use domain::{AccountManager, Product, ProductType};
    use ledger_client::SimulatedPointsLedger;
    use store::InMemoryStore;

    type Orchestrator = RedemptionOrchestrator<
        InMemoryStore,
        SimulatedPointsLedger,
        InMemoryVirtualFulfillment,
        RecordingNotifications,
    >;

    struct Fixture {
        orchestrator: Orchestrator,
        store: InMemoryStore,
        company: Company,
        manager: AccountManager,
        mug: Product,
        gift_card: Product,
    }

    async fn setup() -> Fixture {
        let store = InMemoryStore::new();
        let ledger = SimulatedPointsLedger::new();
        let orchestrator = RedemptionOrchestrator::new(
            store.clone(),
            ledger,
            InMemoryVirtualFulfillment::new(),
            RecordingNotifications::new(),
        );

        let company = Company::new("Acme Corp", "ACME001");
        store.upsert_company(&company).await.unwrap();

        let manager = AccountManager::new(company.id, "Jordan Smith", "jordan@acme.example");
        store.upsert_account_manager(&manager).await.unwrap();

        let mug = Product::new("MUG-001", "Branded Mug", Points::new(500), ProductType::Physical);
        store.upsert_product(&mug).await.unwrap();
        store.initialize(mug.id, 10, Some(3)).await.unwrap();

        let gift_card = Product::new(
            "GIFT-050",
            "$50 Gift Card",
            Points::new(5_000),
            ProductType::Virtual,
        );
        store.upsert_product(&gift_card).await.unwrap();

        Fixture {
            orchestrator,
            store,
            company,
            manager,
            mug,
            gift_card,
        }
    }

    fn request(fixture: &Fixture, lines: Vec<OrderLine>) -> CreateOrderRequest {
        CreateOrderRequest {
            company_id: fixture.company.id,
            account_manager_id: fixture.manager.id,
            lines,
            shipping_address: Some("1 Main St, Springfield".to_string()),
            special_instructions: None,
        }
    }

    #[tokio::test]
    async fn test_create_order_snapshots_costs_and_reserves() {
        let fixture = setup().await;
        let order = fixture
            .orchestrator
            .create_order(request(
                &fixture,
                vec![
                    OrderLine {
                        product_id: fixture.mug.id,
                        quantity: 2,
                    },
                    OrderLine {
                        product_id: fixture.gift_card.id,
                        quantity: 1,
                    },
                ],
            ))
            .await
            .unwrap();

        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.total_points, Points::new(6_000));

        let items = fixture.store.items_for_order(order.id).await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].points_per_item, Points::new(500));

        // Physical line reserved, virtual line not
        let inventory = fixture.store.get_inventory(fixture.mug.id).await.unwrap().unwrap();
        assert_eq!(inventory.quantity_available, 8);
        assert_eq!(inventory.quantity_reserved, 2);
    }

    #[tokio::test]
    async fn test_create_order_empty_lines() {
        let fixture = setup().await;
        let err = fixture
            .orchestrator
            .create_order(request(&fixture, vec![]))
            .await
            .unwrap_err();
        assert!(matches!(err, RedemptionError::EmptyOrder));
    }

    #[tokio::test]
    async fn test_create_order_inactive_company() {
        let fixture = setup().await;
        let mut company = fixture.company.clone();
        company.is_active = false;
        fixture.store.upsert_company(&company).await.unwrap();

        let err = fixture
            .orchestrator
            .create_order(request(
                &fixture,
                vec![OrderLine {
                    product_id: fixture.mug.id,
                    quantity: 1,
                }],
            ))
            .await
            .unwrap_err();
        assert!(matches!(err, RedemptionError::CompanyInactive { .. }));
    }

    #[tokio::test]
    async fn test_create_order_company_without_loyalty_account() {
        let fixture = setup().await;
        let mut company = fixture.company.clone();
        company.loyalty_account_id = None;
        fixture.store.upsert_company(&company).await.unwrap();

        let err = fixture
            .orchestrator
            .create_order(request(
                &fixture,
                vec![OrderLine {
                    product_id: fixture.mug.id,
                    quantity: 1,
                }],
            ))
            .await
            .unwrap_err();
        assert!(matches!(err, RedemptionError::NoLoyaltyAccount { .. }));
    }

    #[tokio::test]
    async fn test_create_order_manager_from_other_company() {
        let fixture = setup().await;
        let other = Company::new("Globex", "GLOBAL002");
        fixture.store.upsert_company(&other).await.unwrap();
        let outsider = AccountManager::new(other.id, "Sam Lee", "sam@globex.example");
        fixture
            .store
            .upsert_account_manager(&outsider)
            .await
            .unwrap();

        let mut req = request(
            &fixture,
            vec![OrderLine {
                product_id: fixture.mug.id,
                quantity: 1,
            }],
        );
        req.account_manager_id = outsider.id;

        let err = fixture.orchestrator.create_order(req).await.unwrap_err();
        assert!(matches!(
            err,
            RedemptionError::AccountManagerMismatch { .. }
        ));
    }

    #[tokio::test]
    async fn test_create_order_inactive_product() {
        let fixture = setup().await;
        let mut mug = fixture.mug.clone();
        mug.is_active = false;
        fixture.store.upsert_product(&mug).await.unwrap();

        let err = fixture
            .orchestrator
            .create_order(request(
                &fixture,
                vec![OrderLine {
                    product_id: mug.id,
                    quantity: 1,
                }],
            ))
            .await
            .unwrap_err();
        assert!(matches!(err, RedemptionError::ProductInactive { .. }));
    }

    #[tokio::test]
    async fn test_create_order_insufficient_inventory() {
        let fixture = setup().await;
        let err = fixture
            .orchestrator
            .create_order(request(
                &fixture,
                vec![OrderLine {
                    product_id: fixture.mug.id,
                    quantity: 11,
                }],
            ))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            RedemptionError::InsufficientInventory {
                requested: 11,
                available: 10,
                ..
            }
        ));

        // Nothing was reserved
        let inventory = fixture.store.get_inventory(fixture.mug.id).await.unwrap().unwrap();
        assert_eq!(inventory.quantity_reserved, 0);
        assert_eq!(fixture.store.order_count().await, 0);
    }

    #[tokio::test]
    async fn test_check_balance() {
        let fixture = setup().await;
        let balance = fixture
            .orchestrator
            .check_balance(fixture.company.id)
            .await
            .unwrap();
        assert_eq!(balance.account_id, "ACME001");
        assert_eq!(balance.balance, Points::new(150_000));
    }

    #[tokio::test]
    async fn test_check_balance_unknown_company() {
        let fixture = setup().await;
        let err = fixture
            .orchestrator
            .check_balance(CompanyId::new())
            .await
            .unwrap_err();
        assert!(matches!(err, RedemptionError::CompanyNotFound { .. }));
    }
}
