//! Health check endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use ledger_client::PointsLedger;
use serde::Serialize;

use crate::Backend;
use crate::routes::orders::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub ledger: bool,
}

/// GET /health — reports service health including ledger reachability.
pub async fn check<S, L>(State(state): State<Arc<AppState<S, L>>>) -> Json<HealthResponse>
where
    S: Backend,
    L: PointsLedger + Clone + 'static,
{
    let ledger = state.ledger.health_check().await;
    Json(HealthResponse {
        status: if ledger { "ok" } else { "degraded" },
        ledger,
    })
}
