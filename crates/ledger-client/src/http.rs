//! HTTP adapter for the real points ledger service.

use std::time::Duration;

use async_trait::async_trait;
use common::Points;
use serde::{Deserialize, Serialize};

use crate::client::{Balance, LedgerReceipt, PointsLedger};
use crate::error::LedgerError;
use crate::retry::{RetryPolicy, retry_with_policy};

/// Connection settings for the ledger service.
///
/// Reads from environment variables:
/// - `LEDGER_BASE_URL` — service root (default: `"http://localhost:8081"`)
/// - `LEDGER_API_KEY` — bearer token, optional
/// - `LEDGER_TIMEOUT_MS` — per-request timeout (default: `10000`)
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8081".to_string(),
            api_key: None,
            timeout: Duration::from_millis(10_000),
            retry: RetryPolicy::default(),
        }
    }
}

impl LedgerConfig {
    /// Loads configuration from environment variables, falling back to
    /// defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_url: std::env::var("LEDGER_BASE_URL").unwrap_or(defaults.base_url),
            api_key: std::env::var("LEDGER_API_KEY").ok(),
            timeout: std::env::var("LEDGER_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.timeout),
            retry: RetryPolicy::default(),
        }
    }
}

#[derive(Serialize)]
struct MovementRequest<'a> {
    points: i64,
    reference: &'a str,
}

#[derive(Deserialize)]
struct MovementResponse {
    transaction_id: String,
    balance_after: Option<i64>,
}

#[derive(Deserialize)]
struct BalanceResponse {
    account_id: String,
    balance: i64,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error_code: Option<String>,
    message: Option<String>,
}

/// Points ledger client over HTTP.
///
/// Every call has a bounded timeout; transient failures (timeouts and 5xx)
/// are retried with exponential backoff, rejections (4xx) are not.
#[derive(Clone)]
pub struct HttpPointsLedger {
    client: reqwest::Client,
    config: LedgerConfig,
}

impl HttpPointsLedger {
    /// Creates a new client from the given configuration.
    pub fn new(config: LedgerConfig) -> Result<Self, LedgerError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LedgerError::Unavailable(e.to_string()))?;
        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url.trim_end_matches('/'))
    }

    fn apply_auth(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }

    async fn decode_error(response: reqwest::Response) -> LedgerError {
        let status = response.status();
        let body = response.json::<ErrorResponse>().await.ok();

        if status.is_server_error() {
            let message = body
                .and_then(|b| b.message)
                .unwrap_or_else(|| status.to_string());
            return LedgerError::Unavailable(message);
        }

        let (code, message) = match body {
            Some(b) => (
                b.error_code.unwrap_or_else(|| "SYSTEM_ERROR".to_string()),
                b.message.unwrap_or_else(|| status.to_string()),
            ),
            None => ("SYSTEM_ERROR".to_string(), status.to_string()),
        };
        LedgerError::Rejected { code, message }
    }

    fn map_transport(err: reqwest::Error) -> LedgerError {
        if err.is_timeout() {
            LedgerError::Timeout
        } else {
            LedgerError::Unavailable(err.to_string())
        }
    }

    async fn movement(
        &self,
        account_id: &str,
        action: &str,
        points: Points,
        reference: &str,
    ) -> Result<LedgerReceipt, LedgerError> {
        let url = self.url(&format!("/accounts/{account_id}/{action}"));
        let response = self
            .apply_auth(self.client.post(&url))
            .json(&MovementRequest {
                points: points.value(),
                reference,
            })
            .send()
            .await
            .map_err(Self::map_transport)?;

        if !response.status().is_success() {
            return Err(Self::decode_error(response).await);
        }

        let body: MovementResponse = response
            .json()
            .await
            .map_err(|e| LedgerError::InvalidResponse(e.to_string()))?;

        Ok(LedgerReceipt {
            transaction_id: body.transaction_id,
            balance_after: body.balance_after.map(Points::new),
        })
    }
}

#[async_trait]
impl PointsLedger for HttpPointsLedger {
    #[tracing::instrument(skip(self))]
    async fn get_balance(&self, account_id: &str) -> Result<Balance, LedgerError> {
        let url = self.url(&format!("/accounts/{account_id}/balance"));
        retry_with_policy(&self.config.retry, "get_balance", || async {
            let response = self
                .apply_auth(self.client.get(&url))
                .send()
                .await
                .map_err(Self::map_transport)?;

            if !response.status().is_success() {
                return Err(Self::decode_error(response).await);
            }

            let body: BalanceResponse = response
                .json()
                .await
                .map_err(|e| LedgerError::InvalidResponse(e.to_string()))?;

            Ok(Balance {
                account_id: body.account_id,
                balance: Points::new(body.balance),
            })
        })
        .await
    }

    #[tracing::instrument(skip(self))]
    async fn debit(
        &self,
        account_id: &str,
        points: Points,
        reference: &str,
    ) -> Result<LedgerReceipt, LedgerError> {
        retry_with_policy(&self.config.retry, "debit", || {
            self.movement(account_id, "debit", points, reference)
        })
        .await
    }

    #[tracing::instrument(skip(self))]
    async fn credit(
        &self,
        account_id: &str,
        points: Points,
        reference: &str,
    ) -> Result<LedgerReceipt, LedgerError> {
        retry_with_policy(&self.config.retry, "credit", || {
            self.movement(account_id, "credit", points, reference)
        })
        .await
    }

    async fn health_check(&self) -> bool {
        let url = self.url("/health");
        match self.client.get(&url).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}
