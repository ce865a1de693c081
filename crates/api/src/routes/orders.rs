//! Order lifecycle and fulfillment endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::{OrderId, OrderItemId};
use domain::{OrderItem, RedemptionOrder};
use ledger_client::PointsLedger;
use redemption::{
    CreateOrderRequest, InMemoryVirtualFulfillment, LoggingNotifications, RedemptionOrchestrator,
};
use serde::{Deserialize, Serialize};
use store::OrderStore;
use uuid::Uuid;

use crate::Backend;
use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<S, L> {
    pub orchestrator:
        RedemptionOrchestrator<S, L, InMemoryVirtualFulfillment, LoggingNotifications>,
    pub store: S,
    pub ledger: L,
}

impl<S, L> AppState<S, L>
where
    S: Backend,
    L: PointsLedger + Clone + 'static,
{
    /// Wires an orchestrator over the given backend and ledger.
    pub fn new(store: S, ledger: L) -> Self {
        let orchestrator = RedemptionOrchestrator::new(
            store.clone(),
            ledger.clone(),
            InMemoryVirtualFulfillment::new(),
            LoggingNotifications,
        );
        Self {
            orchestrator,
            store,
            ledger,
        }
    }
}

// -- Request types --

#[derive(Deserialize)]
pub struct CancelRequest {
    pub reason: String,
}

#[derive(Deserialize)]
pub struct ShipRequest {
    pub tracking_number: String,
}

// -- Response types --

#[derive(Serialize)]
pub struct OrderResponse {
    pub id: String,
    pub order_number: String,
    pub company_id: String,
    pub account_manager_id: String,
    pub status: String,
    pub total_points: i64,
    pub shipping_address: Option<String>,
    pub special_instructions: Option<String>,
    pub cancellation_reason: Option<String>,
    pub items: Vec<ItemResponse>,
}

#[derive(Serialize)]
pub struct ItemResponse {
    pub id: String,
    pub product_id: String,
    pub sku: String,
    pub product_type: String,
    pub quantity: u32,
    pub points_per_item: i64,
    pub fulfillment_status: String,
    pub fulfillment_reference: Option<String>,
    pub tracking_number: Option<String>,
}

impl OrderResponse {
    fn from_order(order: &RedemptionOrder, items: &[OrderItem]) -> Self {
        Self {
            id: order.id.to_string(),
            order_number: order.order_number.clone(),
            company_id: order.company_id.to_string(),
            account_manager_id: order.account_manager_id.to_string(),
            status: order.status.to_string(),
            total_points: order.total_points.value(),
            shipping_address: order.shipping_address.clone(),
            special_instructions: order.special_instructions.clone(),
            cancellation_reason: order.cancellation_reason.clone(),
            items: items.iter().map(ItemResponse::from_item).collect(),
        }
    }
}

impl ItemResponse {
    fn from_item(item: &OrderItem) -> Self {
        Self {
            id: item.id.to_string(),
            product_id: item.product_id.to_string(),
            sku: item.sku.clone(),
            product_type: item.product_type.to_string(),
            quantity: item.quantity,
            points_per_item: item.points_per_item.value(),
            fulfillment_status: item.fulfillment_status.to_string(),
            fulfillment_reference: item.fulfillment_reference.clone(),
            tracking_number: item.tracking_number.clone(),
        }
    }
}

// -- Handlers --

/// POST /orders — validate and create a new order.
#[tracing::instrument(skip(state, req))]
pub async fn create<S, L>(
    State(state): State<Arc<AppState<S, L>>>,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError>
where
    S: Backend,
    L: PointsLedger + Clone + 'static,
{
    let order = state.orchestrator.create_order(req).await?;
    let items = state.store.items_for_order(order.id).await?;
    Ok((
        StatusCode::CREATED,
        Json(OrderResponse::from_order(&order, &items)),
    ))
}

/// GET /orders/{id} — order with its items.
pub async fn get<S, L>(
    State(state): State<Arc<AppState<S, L>>>,
    Path(id): Path<Uuid>,
) -> Result<Json<OrderResponse>, ApiError>
where
    S: Backend,
    L: PointsLedger + Clone + 'static,
{
    let order_id = OrderId::from_uuid(id);
    let order = state
        .store
        .get_order(order_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Order not found: {order_id}")))?;
    let items = state.store.items_for_order(order_id).await?;
    Ok(Json(OrderResponse::from_order(&order, &items)))
}

/// POST /orders/{id}/process — debit points and start fulfillment.
#[tracing::instrument(skip(state))]
pub async fn process<S, L>(
    State(state): State<Arc<AppState<S, L>>>,
    Path(id): Path<Uuid>,
) -> Result<Json<OrderResponse>, ApiError>
where
    S: Backend,
    L: PointsLedger + Clone + 'static,
{
    let order = state
        .orchestrator
        .process_order(OrderId::from_uuid(id))
        .await?;
    let items = state.store.items_for_order(order.id).await?;
    Ok(Json(OrderResponse::from_order(&order, &items)))
}

/// POST /orders/{id}/cancel — cancel an order, refunding if needed.
#[tracing::instrument(skip(state, req))]
pub async fn cancel<S, L>(
    State(state): State<Arc<AppState<S, L>>>,
    Path(id): Path<Uuid>,
    Json(req): Json<CancelRequest>,
) -> Result<Json<OrderResponse>, ApiError>
where
    S: Backend,
    L: PointsLedger + Clone + 'static,
{
    if req.reason.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "Cancellation reason is required".to_string(),
        ));
    }
    let order = state
        .orchestrator
        .cancel_order(OrderId::from_uuid(id), &req.reason)
        .await?;
    let items = state.store.items_for_order(order.id).await?;
    Ok(Json(OrderResponse::from_order(&order, &items)))
}

/// POST /items/{id}/ship — record a carrier handoff.
#[tracing::instrument(skip(state, req))]
pub async fn ship<S, L>(
    State(state): State<Arc<AppState<S, L>>>,
    Path(id): Path<Uuid>,
    Json(req): Json<ShipRequest>,
) -> Result<Json<ItemResponse>, ApiError>
where
    S: Backend,
    L: PointsLedger + Clone + 'static,
{
    if req.tracking_number.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "Tracking number is required".to_string(),
        ));
    }
    let item = state
        .orchestrator
        .workflow()
        .mark_item_shipped(OrderItemId::from_uuid(id), &req.tracking_number)
        .await?;
    Ok(Json(ItemResponse::from_item(&item)))
}

/// POST /items/{id}/deliver — record customer delivery.
#[tracing::instrument(skip(state))]
pub async fn deliver<S, L>(
    State(state): State<Arc<AppState<S, L>>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ItemResponse>, ApiError>
where
    S: Backend,
    L: PointsLedger + Clone + 'static,
{
    let item = state
        .orchestrator
        .workflow()
        .mark_item_delivered(OrderItemId::from_uuid(id))
        .await?;
    Ok(Json(ItemResponse::from_item(&item)))
}
