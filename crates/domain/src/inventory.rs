//! Inventory stock arithmetic for physical products.

use chrono::{DateTime, Utc};
use common::ProductId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from inventory operations.
///
/// Every failed precondition leaves the record untouched; quantities are
/// never clamped.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InventoryError {
    /// Requested more than is available to reserve.
    #[error("Insufficient stock: requested {requested}, available {available}")]
    InsufficientStock { requested: u32, available: u32 },

    /// Tried to release more than is currently reserved.
    #[error("Cannot release {requested}: only {reserved} reserved")]
    OverRelease { requested: u32, reserved: u32 },

    /// Tried to confirm more than is currently reserved.
    #[error("Cannot confirm {requested}: only {reserved} reserved")]
    OverConfirm { requested: u32, reserved: u32 },

    /// Adding stock would exceed the configured maximum.
    #[error("Adding {requested} would exceed capacity {capacity}")]
    ExceedsCapacity { requested: u32, capacity: u32 },

    /// Quantity must be greater than zero.
    #[error("Invalid quantity: {quantity} (must be greater than 0)")]
    InvalidQuantity { quantity: u32 },
}

/// Stock record for a single physical product.
///
/// `quantity_available` is stock free to promise; `quantity_reserved` is
/// stock held for pending orders. Reserve and release move quantity between
/// the two buckets, confirm removes reserved stock permanently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Inventory {
    pub product_id: ProductId,
    pub quantity_available: u32,
    pub quantity_reserved: u32,
    pub reorder_point: Option<u32>,
    pub max_quantity: Option<u32>,
    pub last_updated: DateTime<Utc>,
}

impl Inventory {
    /// Creates a new stock record with the given starting quantity.
    pub fn new(product_id: ProductId, initial_quantity: u32, reorder_point: Option<u32>) -> Self {
        Self {
            product_id,
            quantity_available: initial_quantity,
            quantity_reserved: 0,
            reorder_point,
            max_quantity: None,
            last_updated: Utc::now(),
        }
    }

    /// Returns true if `quantity` units are free to reserve.
    pub fn check_availability(&self, quantity: u32) -> bool {
        quantity <= self.quantity_available
    }

    /// Moves `quantity` units from available to reserved.
    pub fn reserve(&mut self, quantity: u32) -> Result<(), InventoryError> {
        if quantity == 0 {
            return Err(InventoryError::InvalidQuantity { quantity });
        }
        if quantity > self.quantity_available {
            return Err(InventoryError::InsufficientStock {
                requested: quantity,
                available: self.quantity_available,
            });
        }
        self.quantity_available -= quantity;
        self.quantity_reserved += quantity;
        self.last_updated = Utc::now();
        Ok(())
    }

    /// Moves `quantity` units from reserved back to available.
    pub fn release(&mut self, quantity: u32) -> Result<(), InventoryError> {
        if quantity == 0 {
            return Err(InventoryError::InvalidQuantity { quantity });
        }
        if quantity > self.quantity_reserved {
            return Err(InventoryError::OverRelease {
                requested: quantity,
                reserved: self.quantity_reserved,
            });
        }
        self.quantity_reserved -= quantity;
        self.quantity_available += quantity;
        self.last_updated = Utc::now();
        Ok(())
    }

    /// Removes `quantity` reserved units permanently (stock has shipped).
    pub fn confirm(&mut self, quantity: u32) -> Result<(), InventoryError> {
        if quantity == 0 {
            return Err(InventoryError::InvalidQuantity { quantity });
        }
        if quantity > self.quantity_reserved {
            return Err(InventoryError::OverConfirm {
                requested: quantity,
                reserved: self.quantity_reserved,
            });
        }
        self.quantity_reserved -= quantity;
        self.last_updated = Utc::now();
        Ok(())
    }

    /// Adds new stock to the available bucket.
    pub fn add_stock(&mut self, quantity: u32) -> Result<(), InventoryError> {
        if quantity == 0 {
            return Err(InventoryError::InvalidQuantity { quantity });
        }
        if let Some(max) = self.max_quantity
            && self.total_on_hand() + quantity > max
        {
            return Err(InventoryError::ExceedsCapacity {
                requested: quantity,
                capacity: max,
            });
        }
        self.quantity_available += quantity;
        self.last_updated = Utc::now();
        Ok(())
    }

    /// Sets or clears the reorder threshold.
    pub fn set_reorder_point(&mut self, reorder_point: Option<u32>) {
        self.reorder_point = reorder_point;
        self.last_updated = Utc::now();
    }

    /// Returns available plus reserved stock.
    pub fn total_on_hand(&self) -> u32 {
        self.quantity_available + self.quantity_reserved
    }

    /// Returns true if available stock has dropped to the reorder point.
    pub fn is_below_reorder_point(&self) -> bool {
        match self.reorder_point {
            Some(point) => self.quantity_available <= point,
            None => false,
        }
    }
}
