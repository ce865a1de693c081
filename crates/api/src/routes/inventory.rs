//! Inventory endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use common::ProductId;
use domain::Inventory;
use ledger_client::PointsLedger;
use serde::{Deserialize, Serialize};
use store::InventoryLedger;
use uuid::Uuid;

use crate::Backend;
use crate::error::ApiError;
use crate::routes::orders::AppState;

#[derive(Deserialize)]
pub struct AddStockRequest {
    pub quantity: u32,
}

#[derive(Serialize)]
pub struct InventoryResponse {
    pub product_id: String,
    pub quantity_available: u32,
    pub quantity_reserved: u32,
    pub total_on_hand: u32,
    pub reorder_point: Option<u32>,
    pub below_reorder_point: bool,
}

impl InventoryResponse {
    fn from_inventory(inventory: &Inventory) -> Self {
        Self {
            product_id: inventory.product_id.to_string(),
            quantity_available: inventory.quantity_available,
            quantity_reserved: inventory.quantity_reserved,
            total_on_hand: inventory.total_on_hand(),
            reorder_point: inventory.reorder_point,
            below_reorder_point: inventory.is_below_reorder_point(),
        }
    }
}

/// GET /inventory/{id} — stock record for a product.
pub async fn get<S, L>(
    State(state): State<Arc<AppState<S, L>>>,
    Path(id): Path<Uuid>,
) -> Result<Json<InventoryResponse>, ApiError>
where
    S: Backend,
    L: PointsLedger + Clone + 'static,
{
    let product_id = ProductId::from_uuid(id);
    let inventory = state
        .store
        .get_inventory(product_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("No inventory record for {product_id}")))?;
    Ok(Json(InventoryResponse::from_inventory(&inventory)))
}

/// POST /inventory/{id}/stock — add received stock to a product.
#[tracing::instrument(skip(state, req))]
pub async fn add_stock<S, L>(
    State(state): State<Arc<AppState<S, L>>>,
    Path(id): Path<Uuid>,
    Json(req): Json<AddStockRequest>,
) -> Result<Json<InventoryResponse>, ApiError>
where
    S: Backend,
    L: PointsLedger + Clone + 'static,
{
    if req.quantity == 0 {
        return Err(ApiError::BadRequest("Quantity must be positive".to_string()));
    }

    let product_id = ProductId::from_uuid(id);
    state.store.add_stock(product_id, req.quantity).await?;

    let inventory = state
        .store
        .get_inventory(product_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("No inventory record for {product_id}")))?;
    Ok(Json(InventoryResponse::from_inventory(&inventory)))
}

/// GET /inventory/low-stock — records at or below their reorder point.
pub async fn low_stock<S, L>(
    State(state): State<Arc<AppState<S, L>>>,
) -> Result<Json<Vec<InventoryResponse>>, ApiError>
where
    S: Backend,
    L: PointsLedger + Clone + 'static,
{
    let records = state.store.low_stock().await?;
    Ok(Json(
        records.iter().map(InventoryResponse::from_inventory).collect(),
    ))
}
