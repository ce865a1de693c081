//! Company balance endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use common::CompanyId;
use ledger_client::PointsLedger;
use serde::Serialize;
use uuid::Uuid;

use crate::Backend;
use crate::error::ApiError;
use crate::routes::orders::AppState;

#[derive(Serialize)]
pub struct BalanceResponse {
    pub account_id: String,
    pub balance: i64,
}

/// GET /companies/{id}/balance — current points balance from the ledger.
#[tracing::instrument(skip(state))]
pub async fn balance<S, L>(
    State(state): State<Arc<AppState<S, L>>>,
    Path(id): Path<Uuid>,
) -> Result<Json<BalanceResponse>, ApiError>
where
    S: Backend,
    L: PointsLedger + Clone + 'static,
{
    let balance = state
        .orchestrator
        .check_balance(CompanyId::from_uuid(id))
        .await?;
    Ok(Json(BalanceResponse {
        account_id: balance.account_id,
        balance: balance.balance.value(),
    }))
}
