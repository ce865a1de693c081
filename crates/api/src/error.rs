//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::OrderError;
use ledger_client::LedgerError;
use redemption::RedemptionError;
use store::StoreError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Redemption use-case error.
    Redemption(RedemptionError),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Redemption(err) => redemption_error_to_response(err),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn redemption_error_to_response(err: RedemptionError) -> (StatusCode, String) {
    let status = match &err {
        RedemptionError::CompanyNotFound { .. }
        | RedemptionError::AccountManagerNotFound { .. }
        | RedemptionError::ProductNotFound { .. }
        | RedemptionError::OrderNotFound { .. }
        | RedemptionError::ItemNotFound { .. } => StatusCode::NOT_FOUND,

        RedemptionError::CompanyInactive { .. }
        | RedemptionError::NoLoyaltyAccount { .. }
        | RedemptionError::AccountManagerInactive { .. }
        | RedemptionError::AccountManagerMismatch { .. }
        | RedemptionError::ProductInactive { .. }
        | RedemptionError::EmptyOrder
        | RedemptionError::InsufficientInventory { .. } => StatusCode::BAD_REQUEST,

        RedemptionError::InvalidState { .. } => StatusCode::CONFLICT,

        RedemptionError::RefundFailed { .. } => StatusCode::BAD_GATEWAY,

        RedemptionError::Order(order_err) => match order_err {
            OrderError::InvalidStateTransition { .. } | OrderError::InvalidItemTransition { .. } => {
                StatusCode::CONFLICT
            }
            OrderError::WrongProductType { .. }
            | OrderError::InvalidQuantity { .. }
            | OrderError::InvalidPointsAmount { .. }
            | OrderError::NoItems => StatusCode::BAD_REQUEST,
        },

        RedemptionError::Transaction(_) => StatusCode::CONFLICT,

        RedemptionError::Ledger(ledger_err) => match ledger_err {
            LedgerError::Rejected { .. } => StatusCode::BAD_REQUEST,
            LedgerError::Unavailable(_) | LedgerError::Timeout | LedgerError::InvalidResponse(_) => {
                StatusCode::BAD_GATEWAY
            }
        },

        RedemptionError::Store(store_err) => match store_err {
            StoreError::OrderNotFound { .. }
            | StoreError::ItemNotFound { .. }
            | StoreError::TransactionNotFound { .. }
            | StoreError::InventoryNotFound { .. } => StatusCode::NOT_FOUND,
            StoreError::DuplicateOrderNumber { .. }
            | StoreError::InventoryAlreadyExists { .. }
            | StoreError::Inventory(_) => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        },
    };

    if status == StatusCode::INTERNAL_SERVER_ERROR {
        tracing::error!(error = %err, "internal server error");
    }
    (status, err.to_string())
}

impl From<RedemptionError> for ApiError {
    fn from(err: RedemptionError) -> Self {
        ApiError::Redemption(err)
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Redemption(RedemptionError::Store(err))
    }
}
