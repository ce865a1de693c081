//! Virtual fulfillment provider trait and in-memory implementation.

use std::sync::Arc;

use async_trait::async_trait;
use common::OrderItemId;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

/// A virtual fulfillment attempt that could not be delivered.
#[derive(Debug, Clone, Error)]
#[error("Fulfillment failed: {0}")]
pub struct FulfillmentError(pub String);

/// Result of a successful virtual delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FulfillmentReceipt {
    /// Provider reference, e.g. `VF-1A2B3C4D`.
    pub reference: String,
}

/// Trait for electronically delivering virtual products.
#[async_trait]
pub trait VirtualFulfillment: Send + Sync {
    /// Delivers a virtual item and returns the provider reference.
    async fn fulfill(
        &self,
        item_id: OrderItemId,
        sku: &str,
        quantity: u32,
    ) -> Result<FulfillmentReceipt, FulfillmentError>;
}

#[derive(Debug, Default)]
struct InMemoryFulfillmentState {
    delivered: Vec<(OrderItemId, String)>,
    fail_on_fulfill: bool,
}

/// In-memory virtual fulfillment provider for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryVirtualFulfillment {
    state: Arc<RwLock<InMemoryFulfillmentState>>,
}

impl InMemoryVirtualFulfillment {
    /// Creates a new in-memory fulfillment provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the provider to fail fulfillment calls.
    pub async fn set_fail_on_fulfill(&self, fail: bool) {
        self.state.write().await.fail_on_fulfill = fail;
    }

    /// Returns the number of delivered items.
    pub async fn delivered_count(&self) -> usize {
        self.state.read().await.delivered.len()
    }

    /// Returns true if the given item was delivered.
    pub async fn has_delivered(&self, item_id: OrderItemId) -> bool {
        self.state
            .read()
            .await
            .delivered
            .iter()
            .any(|(id, _)| *id == item_id)
    }
}

#[async_trait]
impl VirtualFulfillment for InMemoryVirtualFulfillment {
    async fn fulfill(
        &self,
        item_id: OrderItemId,
        sku: &str,
        _quantity: u32,
    ) -> Result<FulfillmentReceipt, FulfillmentError> {
        let mut state = self.state.write().await;

        if state.fail_on_fulfill {
            return Err(FulfillmentError(format!("provider rejected {sku}")));
        }

        let reference = format!(
            "VF-{}",
            Uuid::new_v4().simple().to_string()[..8].to_uppercase()
        );
        state.delivered.push((item_id, reference.clone()));

        Ok(FulfillmentReceipt { reference })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fulfill_returns_reference() {
        let provider = InMemoryVirtualFulfillment::new();
        let item_id = OrderItemId::new();

        let receipt = provider.fulfill(item_id, "GIFT-050", 1).await.unwrap();
        assert!(receipt.reference.starts_with("VF-"));
        assert_eq!(provider.delivered_count().await, 1);
        assert!(provider.has_delivered(item_id).await);
    }

    #[tokio::test]
    async fn test_fail_on_fulfill() {
        let provider = InMemoryVirtualFulfillment::new();
        provider.set_fail_on_fulfill(true).await;

        let result = provider.fulfill(OrderItemId::new(), "GIFT-050", 1).await;
        assert!(result.is_err());
        assert_eq!(provider.delivered_count().await, 0);
    }
}
