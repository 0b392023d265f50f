//! HTTP routes for the scanner service.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;
use value_common::config::ValuationConfig;

use crate::data::{normalize_ticker, ProviderError};
use crate::screener::{normalize_all, ScanResult};
use crate::valuation::{EvaluationError, ValuationResult};
use crate::ScannerState;

/// Upper bound on tickers per scan request.
pub const MAX_SCAN_TICKERS: usize = 100;

// ============================================================================
// Request / Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub service: String,
    pub provider: String,
}

/// Batch scan request
#[derive(Debug, Deserialize)]
pub struct ScanRequest {
    pub tickers: Vec<String>,
    /// Sort by discount; defaults to `report.sort_by_discount`
    #[serde(default)]
    pub sort: Option<bool>,
    #[serde(default)]
    pub undervalued_only: bool,
}

/// Error body returned by every failing endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticker: Option<String>,
}

/// Error response with status.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            body: ErrorBody {
                error: message.into(),
                kind: "invalid_request".to_string(),
                ticker: None,
            },
        }
    }

    fn evaluation(ticker: &str, error: &EvaluationError) -> Self {
        Self {
            status: evaluation_status(error),
            body: ErrorBody {
                error: error.to_string(),
                kind: error.kind().to_string(),
                ticker: Some(ticker.to_string()),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// HTTP status for a failed evaluation.
pub fn evaluation_status(error: &EvaluationError) -> StatusCode {
    if error.is_data_issue() {
        return StatusCode::UNPROCESSABLE_ENTITY;
    }
    match error {
        EvaluationError::Fetch(ProviderError::NotFound(_)) => StatusCode::NOT_FOUND,
        EvaluationError::Fetch(ProviderError::RateLimited { .. }) => StatusCode::TOO_MANY_REQUESTS,
        EvaluationError::Fetch(ProviderError::InvalidRequest(_)) => StatusCode::BAD_REQUEST,
        _ => StatusCode::BAD_GATEWAY,
    }
}

// ============================================================================
// Route Handlers
// ============================================================================

/// Health check endpoint
pub async fn health(State(state): State<Arc<ScannerState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        service: "value-scanner".to_string(),
        provider: state.engine.provider().name().to_string(),
    })
}

/// Evaluate a single ticker
pub async fn get_valuation(
    State(state): State<Arc<ScannerState>>,
    Path(raw): Path<String>,
) -> Result<Json<ValuationResult>, ApiError> {
    let ticker = normalize_ticker(&raw).ok_or_else(|| ApiError::bad_request("empty ticker"))?;

    state.engine.evaluate_ticker(&ticker).await.map(Json).map_err(|e| {
        warn!(ticker = %ticker, kind = e.kind(), "Valuation failed: {}", e);
        ApiError::evaluation(&ticker, &e)
    })
}

/// Evaluate a batch of tickers
pub async fn scan(
    State(state): State<Arc<ScannerState>>,
    Json(request): Json<ScanRequest>,
) -> Result<Json<ScanResult>, ApiError> {
    let tickers = normalize_all(&request.tickers);
    if tickers.is_empty() {
        return Err(ApiError::bad_request("no tickers given"));
    }
    if tickers.len() > MAX_SCAN_TICKERS {
        return Err(ApiError::bad_request(format!(
            "too many tickers: {} (max {})",
            tickers.len(),
            MAX_SCAN_TICKERS
        )));
    }

    let mut result = state.engine.run(&tickers).await;
    if request.undervalued_only {
        result.retain_undervalued();
    }
    if request.sort.unwrap_or(state.config.report.sort_by_discount) {
        result.sort_by_discount();
    }

    Ok(Json(result))
}

/// Active valuation parameters
pub async fn get_config(State(state): State<Arc<ScannerState>>) -> Json<ValuationConfig> {
    Json(state.engine.calculator().config().clone())
}
