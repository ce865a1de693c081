//! Fulfillment workflow.
//!
//! Moves individual line items through their fulfillment lifecycle and
//! completes the order once every item has reached its customer. Physical
//! items wait for warehouse actions (ship, deliver); virtual items are
//! delivered through a `VirtualFulfillment` provider as soon as the order
//! starts processing.

use common::{OrderId, OrderItemId};
use domain::{FulfillmentStatus, OrderItem, OrderStatus};
use store::{InventoryLedger, OrderStore};

use crate::error::RedemptionError;
use crate::services::{
    FulfillmentError, FulfillmentReceipt, NotificationEvent, NotificationSink, VirtualFulfillment,
};

/// Drives items through fulfillment and orders to completion.
#[derive(Debug, Clone)]
pub struct OrderWorkflowEngine<S, F, N> {
    store: S,
    fulfillment: F,
    notifications: N,
}

impl<S, F, N> OrderWorkflowEngine<S, F, N>
where
    S: OrderStore + InventoryLedger + Clone,
    F: VirtualFulfillment + Clone,
    N: NotificationSink + Clone,
{
    /// Creates a workflow engine over the given store and collaborators.
    pub fn new(store: S, fulfillment: F, notifications: N) -> Self {
        Self {
            store,
            fulfillment,
            notifications,
        }
    }

    /// Starts fulfillment for every item of an order that just entered
    /// processing.
    ///
    /// Physical items move to `Processing` and wait for the warehouse;
    /// their reserved stock is consumed here, the point of no return for
    /// inventory. Virtual items are sent to the fulfillment provider
    /// immediately and end up `Fulfilled` or `Failed`.
    #[tracing::instrument(skip(self))]
    pub async fn initiate_fulfillment(&self, order_id: OrderId) -> Result<(), RedemptionError> {
        let order = self
            .store
            .get_order(order_id)
            .await?
            .ok_or(RedemptionError::OrderNotFound { order_id })?;

        if order.status != OrderStatus::Processing {
            return Err(RedemptionError::InvalidState {
                current_status: order.status,
                action: "initiate fulfillment",
            });
        }

        self.notifications
            .notify(NotificationEvent::OrderConfirmed {
                order_id: order.id,
                order_number: order.order_number.clone(),
            })
            .await;

        for mut item in self.store.items_for_order(order_id).await? {
            item.begin_fulfillment()?;
            self.store.update_item(&item).await?;

            if item.product_type.requires_shipping() {
                self.store.confirm(item.product_id, item.quantity).await?;
                self.notifications
                    .notify(NotificationEvent::PhysicalFulfillmentNeeded {
                        order_id: order.id,
                        item_id: item.id,
                    })
                    .await;
            } else {
                let outcome = self
                    .fulfillment
                    .fulfill(item.id, &item.sku, item.quantity)
                    .await;
                self.apply_virtual_outcome(item.id, outcome).await?;
            }
        }

        Ok(())
    }

    /// Applies a virtual fulfillment outcome to an item.
    ///
    /// A late outcome, arriving after the order was cancelled or the item
    /// already moved on, is dropped without touching anything.
    #[tracing::instrument(skip(self, outcome))]
    pub async fn apply_virtual_outcome(
        &self,
        item_id: OrderItemId,
        outcome: Result<FulfillmentReceipt, FulfillmentError>,
    ) -> Result<(), RedemptionError> {
        let mut item = self
            .store
            .get_item(item_id)
            .await?
            .ok_or(RedemptionError::ItemNotFound { item_id })?;
        let order = self
            .store
            .get_order(item.order_id)
            .await?
            .ok_or(RedemptionError::OrderNotFound {
                order_id: item.order_id,
            })?;

        if order.status != OrderStatus::Processing
            || item.fulfillment_status != FulfillmentStatus::Processing
        {
            tracing::debug!(%item_id, order_status = %order.status, "Dropping stale fulfillment outcome");
            return Ok(());
        }

        match outcome {
            Ok(receipt) => {
                item.mark_fulfilled(&receipt.reference)?;
                self.store.update_item(&item).await?;
                self.notifications
                    .notify(NotificationEvent::VirtualItemDelivered {
                        order_id: order.id,
                        item_id: item.id,
                        reference: receipt.reference,
                    })
                    .await;
                self.check_order_completion(order.id).await?;
            }
            Err(err) => {
                item.mark_failed()?;
                self.store.update_item(&item).await?;
                self.notifications
                    .notify(NotificationEvent::FulfillmentFailed {
                        order_id: order.id,
                        item_id: item.id,
                        reason: err.to_string(),
                    })
                    .await;
            }
        }

        Ok(())
    }

    /// Records a carrier handoff for a physical item.
    #[tracing::instrument(skip(self))]
    pub async fn mark_item_shipped(
        &self,
        item_id: OrderItemId,
        tracking_number: &str,
    ) -> Result<OrderItem, RedemptionError> {
        let mut item = self
            .store
            .get_item(item_id)
            .await?
            .ok_or(RedemptionError::ItemNotFound { item_id })?;
        let order = self
            .store
            .get_order(item.order_id)
            .await?
            .ok_or(RedemptionError::OrderNotFound {
                order_id: item.order_id,
            })?;

        if order.status != OrderStatus::Processing {
            return Err(RedemptionError::InvalidState {
                current_status: order.status,
                action: "ship item",
            });
        }

        item.mark_shipped(tracking_number)?;
        self.store.update_item(&item).await?;

        self.notifications
            .notify(NotificationEvent::ItemShipped {
                order_id: order.id,
                item_id: item.id,
                tracking_number: tracking_number.to_string(),
            })
            .await;

        Ok(item)
    }

    /// Records delivery of a shipped item and completes the order if it was
    /// the last one outstanding.
    #[tracing::instrument(skip(self))]
    pub async fn mark_item_delivered(
        &self,
        item_id: OrderItemId,
    ) -> Result<OrderItem, RedemptionError> {
        let mut item = self
            .store
            .get_item(item_id)
            .await?
            .ok_or(RedemptionError::ItemNotFound { item_id })?;

        item.mark_delivered()?;
        self.store.update_item(&item).await?;

        self.notifications
            .notify(NotificationEvent::ItemDelivered {
                order_id: item.order_id,
                item_id: item.id,
            })
            .await;

        self.check_order_completion(item.order_id).await?;
        Ok(item)
    }

    /// Completes the order if every item has reached its customer.
    ///
    /// Idempotent: returns true if the order is complete (now or already),
    /// false otherwise. Orders that are not processing are left alone.
    #[tracing::instrument(skip(self))]
    pub async fn check_order_completion(&self, order_id: OrderId) -> Result<bool, RedemptionError> {
        let mut order = self
            .store
            .get_order(order_id)
            .await?
            .ok_or(RedemptionError::OrderNotFound { order_id })?;

        if order.status == OrderStatus::Completed {
            return Ok(true);
        }
        if order.status != OrderStatus::Processing {
            return Ok(false);
        }

        let items = self.store.items_for_order(order_id).await?;
        if items.is_empty() || !items.iter().all(|i| i.fulfillment_status.is_complete()) {
            return Ok(false);
        }

        order.complete()?;
        self.store.update_order(&order).await?;

        tracing::info!(%order_id, order_number = %order.order_number, "Order completed");
        self.notifications
            .notify(NotificationEvent::OrderCompleted {
                order_id: order.id,
                order_number: order.order_number.clone(),
            })
            .await;

        Ok(true)
    }

    /// Returns physical items waiting for the warehouse to ship them.
    pub async fn pending_manual_fulfillment(&self) -> Result<Vec<OrderItem>, RedemptionError> {
        let items = self
            .store
            .items_with_status(FulfillmentStatus::Processing)
            .await?;
        Ok(items
            .into_iter()
            .filter(|i| i.product_type.requires_shipping())
            .collect())
    }

    /// Returns items whose fulfillment failed.
    pub async fn failed_items(&self) -> Result<Vec<OrderItem>, RedemptionError> {
        Ok(self
            .store
            .items_with_status(FulfillmentStatus::Failed)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{InMemoryVirtualFulfillment, RecordingNotifications};
    use common::{AccountManagerId, CompanyId, Points, ProductId};
    use domain::{ProductType, RedemptionOrder};
    use store::InMemoryStore;

    type Engine = OrderWorkflowEngine<InMemoryStore, InMemoryVirtualFulfillment, RecordingNotifications>;

    fn setup() -> (Engine, InMemoryStore, InMemoryVirtualFulfillment, RecordingNotifications) {
        let store = InMemoryStore::new();
        let fulfillment = InMemoryVirtualFulfillment::new();
        let notifications = RecordingNotifications::new();
        let engine = OrderWorkflowEngine::new(
            store.clone(),
            fulfillment.clone(),
            notifications.clone(),
        );
        (engine, store, fulfillment, notifications)
    }

    async fn processing_order(
        store: &InMemoryStore,
        lines: &[(ProductType, u32)],
    ) -> (RedemptionOrder, Vec<OrderItem>) {
        let mut total = Points::zero();
        let mut items = Vec::new();
        let mut order = RedemptionOrder::new(
            CompanyId::new(),
            AccountManagerId::new(),
            Points::new(1),
            Some("1 Main St".to_string()),
            None,
        )
        .unwrap();

        for (i, (product_type, quantity)) in lines.iter().enumerate() {
            let item = OrderItem::new(
                order.id,
                ProductId::new(),
                format!("SKU-{i}"),
                *product_type,
                *quantity,
                Points::new(500),
            )
            .unwrap();
            if product_type.requires_shipping() {
                store.initialize(item.product_id, 10, None).await.unwrap();
                store.reserve(item.product_id, *quantity).await.unwrap();
            }
            total += item.total_points();
            items.push(item);
        }

        order.total_points = total;
        order.begin_processing().unwrap();
        store.insert_order(&order, &items).await.unwrap();
        (order, items)
    }

    #[tokio::test]
    async fn test_initiate_fulfillment_mixed_order() {
        let (engine, store, _fulfillment, notifications) = setup();
        let (order, items) = processing_order(
            &store,
            &[(ProductType::Physical, 2), (ProductType::Virtual, 1)],
        )
        .await;

        engine.initiate_fulfillment(order.id).await.unwrap();

        let physical = store.get_item(items[0].id).await.unwrap().unwrap();
        assert_eq!(physical.fulfillment_status, FulfillmentStatus::Processing);

        let virtual_item = store.get_item(items[1].id).await.unwrap().unwrap();
        assert_eq!(virtual_item.fulfillment_status, FulfillmentStatus::Fulfilled);
        assert!(virtual_item.fulfillment_reference.as_deref().unwrap().starts_with("VF-"));

        // Physical item still outstanding, so the order stays processing
        let order = store.get_order(order.id).await.unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::Processing);

        assert!(
            notifications
                .contains(|e| matches!(e, NotificationEvent::OrderConfirmed { .. }))
                .await
        );
        assert!(
            notifications
                .contains(|e| matches!(e, NotificationEvent::PhysicalFulfillmentNeeded { .. }))
                .await
        );
        assert!(
            notifications
                .contains(|e| matches!(e, NotificationEvent::VirtualItemDelivered { .. }))
                .await
        );
    }

    #[tokio::test]
    async fn test_virtual_only_order_completes_immediately() {
        let (engine, store, _fulfillment, notifications) = setup();
        let (order, _) = processing_order(&store, &[(ProductType::Virtual, 1)]).await;

        engine.initiate_fulfillment(order.id).await.unwrap();

        let order = store.get_order(order.id).await.unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::Completed);
        assert!(order.completed_at.is_some());
        assert!(
            notifications
                .contains(|e| matches!(e, NotificationEvent::OrderCompleted { .. }))
                .await
        );
    }

    #[tokio::test]
    async fn test_virtual_failure_marks_item_failed() {
        let (engine, store, fulfillment, notifications) = setup();
        fulfillment.set_fail_on_fulfill(true).await;
        let (order, items) = processing_order(&store, &[(ProductType::Virtual, 1)]).await;

        engine.initiate_fulfillment(order.id).await.unwrap();

        let item = store.get_item(items[0].id).await.unwrap().unwrap();
        assert_eq!(item.fulfillment_status, FulfillmentStatus::Failed);

        let order = store.get_order(order.id).await.unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::Processing);

        assert!(
            notifications
                .contains(|e| matches!(e, NotificationEvent::FulfillmentFailed { .. }))
                .await
        );
        assert_eq!(engine.failed_items().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_initiate_requires_processing_order() {
        let (engine, store, _fulfillment, _notifications) = setup();

        let order = RedemptionOrder::new(
            CompanyId::new(),
            AccountManagerId::new(),
            Points::new(500),
            None,
            None,
        )
        .unwrap();
        let item = OrderItem::new(
            order.id,
            ProductId::new(),
            "GIFT-050",
            ProductType::Virtual,
            1,
            Points::new(500),
        )
        .unwrap();
        store.insert_order(&order, &[item]).await.unwrap();

        let err = engine.initiate_fulfillment(order.id).await.unwrap_err();
        assert!(matches!(
            err,
            RedemptionError::InvalidState {
                current_status: OrderStatus::Pending,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_initiate_confirms_reserved_inventory() {
        let (engine, store, _fulfillment, notifications) = setup();
        let (order, items) = processing_order(&store, &[(ProductType::Physical, 2)]).await;
        let product_id = items[0].product_id;

        engine.initiate_fulfillment(order.id).await.unwrap();

        // Reserved units are consumed as soon as fulfillment starts
        let inventory = store.get_inventory(product_id).await.unwrap().unwrap();
        assert_eq!(inventory.quantity_available, 8);
        assert_eq!(inventory.quantity_reserved, 0);

        let shipped = engine
            .mark_item_shipped(items[0].id, "1Z999AA10123456784")
            .await
            .unwrap();
        assert_eq!(shipped.fulfillment_status, FulfillmentStatus::Shipped);
        assert_eq!(shipped.tracking_number.as_deref(), Some("1Z999AA10123456784"));

        // Shipping itself does not touch stock
        let inventory = store.get_inventory(product_id).await.unwrap().unwrap();
        assert_eq!(inventory.quantity_available, 8);
        assert_eq!(inventory.quantity_reserved, 0);

        assert!(
            notifications
                .contains(|e| matches!(e, NotificationEvent::ItemShipped { .. }))
                .await
        );
    }

    #[tokio::test]
    async fn test_deliver_last_item_completes_order() {
        let (engine, store, _fulfillment, _notifications) = setup();
        let (order, items) = processing_order(&store, &[(ProductType::Physical, 1)]).await;

        engine.initiate_fulfillment(order.id).await.unwrap();
        engine
            .mark_item_shipped(items[0].id, "1Z999AA10123456784")
            .await
            .unwrap();
        let delivered = engine.mark_item_delivered(items[0].id).await.unwrap();
        assert_eq!(delivered.fulfillment_status, FulfillmentStatus::Delivered);

        let order = store.get_order(order.id).await.unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::Completed);

        // Idempotent once completed
        assert!(engine.check_order_completion(order.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_stale_virtual_outcome_is_dropped() {
        let (engine, store, _fulfillment, _notifications) = setup();
        let (mut order, items) = processing_order(&store, &[(ProductType::Virtual, 1)]).await;

        let mut item = items[0].clone();
        item.begin_fulfillment().unwrap();
        store.update_item(&item).await.unwrap();

        order.cancel("no longer needed").unwrap();
        store.update_order(&order).await.unwrap();

        engine
            .apply_virtual_outcome(
                item.id,
                Ok(FulfillmentReceipt {
                    reference: "VF-1A2B3C4D".to_string(),
                }),
            )
            .await
            .unwrap();

        // Untouched: the outcome arrived after cancellation
        let item = store.get_item(item.id).await.unwrap().unwrap();
        assert_eq!(item.fulfillment_status, FulfillmentStatus::Processing);
        assert!(item.fulfillment_reference.is_none());
    }

    #[tokio::test]
    async fn test_pending_manual_fulfillment_lists_physical_only() {
        let (engine, store, _fulfillment, _notifications) = setup();
        let (order, _) = processing_order(
            &store,
            &[(ProductType::Physical, 1), (ProductType::Virtual, 1)],
        )
        .await;

        engine.initiate_fulfillment(order.id).await.unwrap();

        let pending = engine.pending_manual_fulfillment().await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].product_type, ProductType::Physical);
    }
}
