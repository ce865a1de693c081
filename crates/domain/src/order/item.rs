//! Order line items.

use chrono::{DateTime, Utc};
use common::{OrderId, OrderItemId, Points, ProductId};
use serde::{Deserialize, Serialize};

use crate::catalog::ProductType;
use crate::order::{FulfillmentStatus, OrderError};

/// A single line of a redemption order.
///
/// The SKU, product type, and points cost are snapshotted at order creation
/// so later catalog edits cannot change what an existing order means.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub sku: String,
    pub product_type: ProductType,
    pub quantity: u32,
    /// Points cost per unit at the time the order was created.
    pub points_per_item: Points,
    pub fulfillment_status: FulfillmentStatus,
    /// Reference from the fulfillment provider, e.g. `VF-1A2B3C4D`.
    pub fulfillment_reference: Option<String>,
    pub tracking_number: Option<String>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl OrderItem {
    /// Creates a new pending line item.
    pub fn new(
        order_id: OrderId,
        product_id: ProductId,
        sku: impl Into<String>,
        product_type: ProductType,
        quantity: u32,
        points_per_item: Points,
    ) -> Result<Self, OrderError> {
        if quantity == 0 {
            return Err(OrderError::InvalidQuantity { quantity });
        }
        if !points_per_item.is_positive() {
            return Err(OrderError::InvalidPointsAmount {
                points: points_per_item.value(),
            });
        }
        Ok(Self {
            id: OrderItemId::new(),
            order_id,
            product_id,
            sku: sku.into(),
            product_type,
            quantity,
            points_per_item,
            fulfillment_status: FulfillmentStatus::Pending,
            fulfillment_reference: None,
            tracking_number: None,
            delivered_at: None,
            created_at: Utc::now(),
        })
    }

    /// Returns the total points for this line (quantity * points_per_item).
    pub fn total_points(&self) -> Points {
        self.points_per_item.multiply(self.quantity)
    }

    /// Moves the item into fulfillment.
    pub fn begin_fulfillment(&mut self) -> Result<(), OrderError> {
        if !self.fulfillment_status.can_begin() {
            return Err(OrderError::InvalidItemTransition {
                current_status: self.fulfillment_status,
                action: "begin fulfillment",
            });
        }
        self.fulfillment_status = FulfillmentStatus::Processing;
        Ok(())
    }

    /// Records a carrier handoff for a physical item.
    pub fn mark_shipped(&mut self, tracking_number: impl Into<String>) -> Result<(), OrderError> {
        if !self.product_type.requires_shipping() {
            return Err(OrderError::WrongProductType {
                product_type: self.product_type,
                action: "ship",
            });
        }
        if !self.fulfillment_status.can_ship() {
            return Err(OrderError::InvalidItemTransition {
                current_status: self.fulfillment_status,
                action: "ship",
            });
        }
        self.fulfillment_status = FulfillmentStatus::Shipped;
        self.tracking_number = Some(tracking_number.into());
        Ok(())
    }

    /// Records delivery of a shipped item.
    pub fn mark_delivered(&mut self) -> Result<(), OrderError> {
        if !self.fulfillment_status.can_deliver() {
            return Err(OrderError::InvalidItemTransition {
                current_status: self.fulfillment_status,
                action: "deliver",
            });
        }
        self.fulfillment_status = FulfillmentStatus::Delivered;
        self.delivered_at = Some(Utc::now());
        Ok(())
    }

    /// Records electronic delivery of a virtual item.
    pub fn mark_fulfilled(&mut self, reference: impl Into<String>) -> Result<(), OrderError> {
        if self.product_type.requires_shipping() {
            return Err(OrderError::WrongProductType {
                product_type: self.product_type,
                action: "auto-fulfill",
            });
        }
        if !self.fulfillment_status.can_fulfill() {
            return Err(OrderError::InvalidItemTransition {
                current_status: self.fulfillment_status,
                action: "fulfill",
            });
        }
        self.fulfillment_status = FulfillmentStatus::Fulfilled;
        self.fulfillment_reference = Some(reference.into());
        self.delivered_at = Some(Utc::now());
        Ok(())
    }

    /// Records a fulfillment failure.
    pub fn mark_failed(&mut self) -> Result<(), OrderError> {
        if !self.fulfillment_status.can_fail() {
            return Err(OrderError::InvalidItemTransition {
                current_status: self.fulfillment_status,
                action: "fail",
            });
        }
        self.fulfillment_status = FulfillmentStatus::Failed;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn physical_item() -> OrderItem {
        OrderItem::new(
            OrderId::new(),
            ProductId::new(),
            "MUG-001",
            ProductType::Physical,
            2,
            Points::new(500),
        )
        .unwrap()
    }

    fn virtual_item() -> OrderItem {
        OrderItem::new(
            OrderId::new(),
            ProductId::new(),
            "GIFT-050",
            ProductType::Virtual,
            1,
            Points::new(5000),
        )
        .unwrap()
    }

    #[test]
    fn test_new_item_is_pending() {
        let item = physical_item();
        assert_eq!(item.fulfillment_status, FulfillmentStatus::Pending);
        assert!(item.tracking_number.is_none());
        assert!(item.delivered_at.is_none());
    }

    #[test]
    fn test_total_points() {
        let item = physical_item();
        assert_eq!(item.total_points(), Points::new(1000));
    }

    #[test]
    fn test_zero_quantity_rejected() {
        let result = OrderItem::new(
            OrderId::new(),
            ProductId::new(),
            "MUG-001",
            ProductType::Physical,
            0,
            Points::new(500),
        );
        assert!(matches!(result, Err(OrderError::InvalidQuantity { quantity: 0 })));
    }

    #[test]
    fn test_physical_ship_deliver_flow() {
        let mut item = physical_item();
        item.begin_fulfillment().unwrap();
        item.mark_shipped("1Z999AA10123456784").unwrap();
        assert_eq!(item.fulfillment_status, FulfillmentStatus::Shipped);
        assert_eq!(item.tracking_number.as_deref(), Some("1Z999AA10123456784"));

        item.mark_delivered().unwrap();
        assert_eq!(item.fulfillment_status, FulfillmentStatus::Delivered);
        assert!(item.delivered_at.is_some());
    }

    #[test]
    fn test_virtual_fulfill_flow() {
        let mut item = virtual_item();
        item.begin_fulfillment().unwrap();
        item.mark_fulfilled("VF-1A2B3C4D").unwrap();

        assert_eq!(item.fulfillment_status, FulfillmentStatus::Fulfilled);
        assert_eq!(item.fulfillment_reference.as_deref(), Some("VF-1A2B3C4D"));
        assert!(item.delivered_at.is_some());
    }

    #[test]
    fn test_cannot_ship_virtual_item() {
        let mut item = virtual_item();
        item.begin_fulfillment().unwrap();
        let err = item.mark_shipped("1Z999").unwrap_err();
        assert!(matches!(
            err,
            OrderError::WrongProductType {
                product_type: ProductType::Virtual,
                ..
            }
        ));
    }

    #[test]
    fn test_cannot_auto_fulfill_physical_item() {
        let mut item = physical_item();
        item.begin_fulfillment().unwrap();
        assert!(item.mark_fulfilled("VF-1234").is_err());
    }

    #[test]
    fn test_cannot_deliver_before_shipping() {
        let mut item = physical_item();
        item.begin_fulfillment().unwrap();
        let err = item.mark_delivered().unwrap_err();
        assert!(matches!(
            err,
            OrderError::InvalidItemTransition {
                current_status: FulfillmentStatus::Processing,
                ..
            }
        ));
    }

    #[test]
    fn test_mark_failed_from_processing() {
        let mut item = virtual_item();
        item.begin_fulfillment().unwrap();
        item.mark_failed().unwrap();
        assert_eq!(item.fulfillment_status, FulfillmentStatus::Failed);

        // Terminal: no further transitions
        assert!(item.mark_failed().is_err());
        assert!(item.begin_fulfillment().is_err());
    }
}
