//! The redemption order entity.

use chrono::{DateTime, Utc};
use common::{AccountManagerId, CompanyId, OrderId, Points};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::order::{OrderError, OrderStatus};

/// A redemption order placed by an account manager on behalf of a company.
///
/// The order owns its line items and transactions; both are keyed by
/// `OrderId` and fetched through the store rather than embedded here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedemptionOrder {
    pub id: OrderId,
    /// Human-facing unique order number, e.g. `LRP-1724777000123-A3F9`.
    pub order_number: String,
    pub company_id: CompanyId,
    pub account_manager_id: AccountManagerId,
    /// Sum of all line totals, snapshotted at creation.
    pub total_points: Points,
    pub status: OrderStatus,
    pub shipping_address: Option<String>,
    pub special_instructions: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub cancellation_reason: Option<String>,
}

impl RedemptionOrder {
    /// Creates a new pending order.
    pub fn new(
        company_id: CompanyId,
        account_manager_id: AccountManagerId,
        total_points: Points,
        shipping_address: Option<String>,
        special_instructions: Option<String>,
    ) -> Result<Self, OrderError> {
        if !total_points.is_positive() {
            return Err(OrderError::InvalidPointsAmount {
                points: total_points.value(),
            });
        }
        Ok(Self {
            id: OrderId::new(),
            order_number: generate_order_number(),
            company_id,
            account_manager_id,
            total_points,
            status: OrderStatus::Pending,
            shipping_address,
            special_instructions,
            created_at: Utc::now(),
            completed_at: None,
            cancelled_at: None,
            cancellation_reason: None,
        })
    }

    /// Moves the order into processing once the points debit succeeded.
    pub fn begin_processing(&mut self) -> Result<(), OrderError> {
        if !self.status.can_process() {
            return Err(OrderError::InvalidStateTransition {
                current_status: self.status,
                action: "begin processing",
            });
        }
        self.status = OrderStatus::Processing;
        Ok(())
    }

    /// Completes the order once every item has reached its customer.
    pub fn complete(&mut self) -> Result<(), OrderError> {
        if !self.status.can_complete() {
            return Err(OrderError::InvalidStateTransition {
                current_status: self.status,
                action: "complete",
            });
        }
        self.status = OrderStatus::Completed;
        self.completed_at = Some(Utc::now());
        Ok(())
    }

    /// Cancels the order with a reason.
    pub fn cancel(&mut self, reason: impl Into<String>) -> Result<(), OrderError> {
        if !self.status.can_cancel() {
            return Err(OrderError::InvalidStateTransition {
                current_status: self.status,
                action: "cancel",
            });
        }
        self.status = OrderStatus::Cancelled;
        self.cancelled_at = Some(Utc::now());
        self.cancellation_reason = Some(reason.into());
        Ok(())
    }

    /// Marks the order failed after an unsuccessful points debit.
    pub fn fail(&mut self) -> Result<(), OrderError> {
        if !self.status.can_fail() {
            return Err(OrderError::InvalidStateTransition {
                current_status: self.status,
                action: "fail",
            });
        }
        self.status = OrderStatus::Failed;
        Ok(())
    }
}

/// Generates a unique order number.
///
/// A millisecond timestamp alone collides when two orders land in the same
/// tick, so a short random suffix is appended.
fn generate_order_number() -> String {
    let millis = Utc::now().timestamp_millis();
    let suffix = Uuid::new_v4().simple().to_string()[..4].to_uppercase();
    format!("LRP-{millis}-{suffix}")
}
