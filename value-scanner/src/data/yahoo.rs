//! Yahoo Finance adapter for fundamentals.
//!
//! Reads the `quoteSummary` endpoint, which bundles the price, key
//! statistics and the annual statements in one request.
//!
//! # Session
//! Yahoo requires a session cookie plus a matching "crumb" token on every
//! quoteSummary call. The cookie comes from any request to `cookie_url`;
//! the crumb from `{base_url}/v1/test/getcrumb`. The crumb is cached and
//! refreshed once when a request is rejected with 401.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::DateTime;
use reqwest::StatusCode;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use value_common::config::ProviderConfig;

use super::provider::{FundamentalsProvider, ProviderError};
use super::rate_limiter::RateLimiter;
use crate::valuation::{FundamentalsRecord, Statement};

// ============================================================================
// Constants
// ============================================================================

/// Modules requested from quoteSummary.
const QUOTE_SUMMARY_MODULES: &str =
    "financialData,defaultKeyStatistics,incomeStatementHistory,cashflowStatementHistory";

/// Crumb endpoint, relative to the base URL.
const CRUMB_PATH: &str = "/v1/test/getcrumb";

/// Statement keys that are metadata rather than line items.
const STATEMENT_META_KEYS: &[&str] = &["endDate", "maxAge"];

// ============================================================================
// Label Mapping
// ============================================================================

/// Convert a camelCase statement key into a Title Case label.
///
/// "capitalExpenditures" -> "Capital Expenditures"
pub fn camel_to_label(key: &str) -> String {
    let mut label = String::with_capacity(key.len() + 4);
    for (i, ch) in key.chars().enumerate() {
        if i == 0 {
            label.extend(ch.to_uppercase());
        } else if ch.is_uppercase() {
            label.push(' ');
            label.push(ch);
        } else {
            label.push(ch);
        }
    }
    label
}

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteSummaryEnvelope {
    quote_summary: QuoteSummary,
}

#[derive(Debug, Deserialize)]
struct QuoteSummary {
    #[serde(default)]
    result: Option<Vec<QuoteSummaryResult>>,
    #[serde(default)]
    error: Option<QuoteSummaryError>,
}

#[derive(Debug, Deserialize)]
struct QuoteSummaryError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteSummaryResult {
    #[serde(default)]
    financial_data: Option<FinancialData>,
    #[serde(default)]
    default_key_statistics: Option<KeyStatistics>,
    #[serde(default)]
    income_statement_history: Option<IncomeStatementHistory>,
    #[serde(default)]
    cashflow_statement_history: Option<CashflowStatementHistory>,
}

/// Yahoo wraps numbers as `{ "raw": 1.0, "fmt": "1.00" }`, or `{}` when absent.
#[derive(Debug, Default, Deserialize)]
struct RawValue {
    #[serde(default)]
    raw: Option<f64>,
}

fn raw(value: &Option<RawValue>) -> Option<f64> {
    value.as_ref().and_then(|v| v.raw)
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FinancialData {
    #[serde(default)]
    current_price: Option<RawValue>,
    #[serde(default)]
    return_on_equity: Option<RawValue>,
    #[serde(default)]
    free_cashflow: Option<RawValue>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct KeyStatistics {
    #[serde(default)]
    trailing_eps: Option<RawValue>,
    #[serde(default)]
    shares_outstanding: Option<RawValue>,
}

type RawStatement = BTreeMap<String, serde_json::Value>;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IncomeStatementHistory {
    #[serde(default)]
    income_statement_history: Vec<RawStatement>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CashflowStatementHistory {
    #[serde(default)]
    cashflow_statements: Vec<RawStatement>,
}

/// Convert the most recent raw statement into labelled line items.
fn convert_statement(statements: &[RawStatement]) -> Option<Statement> {
    let latest = statements.first()?;
    let mut statement = Statement::new();

    for (key, value) in latest {
        if STATEMENT_META_KEYS.contains(&key.as_str()) {
            continue;
        }
        if let Some(v) = value.get("raw").and_then(|r| r.as_f64()) {
            statement.insert(camel_to_label(key), v);
        }
    }

    if let Some(end) = latest
        .get("endDate")
        .and_then(|d| d.get("raw"))
        .and_then(|r| r.as_i64())
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
    {
        statement = statement.with_period_end(end.date_naive());
    }

    Some(statement)
}

impl QuoteSummaryResult {
    fn into_record(self, ticker: &str) -> FundamentalsRecord {
        let financial = self.financial_data.unwrap_or_default();
        let stats = self.default_key_statistics.unwrap_or_default();

        FundamentalsRecord {
            ticker: ticker.to_string(),
            current_price: raw(&financial.current_price),
            trailing_eps: raw(&stats.trailing_eps),
            shares_outstanding: raw(&stats.shares_outstanding),
            return_on_equity: raw(&financial.return_on_equity),
            free_cashflow: raw(&financial.free_cashflow),
            income_statement: self
                .income_statement_history
                .and_then(|h| convert_statement(&h.income_statement_history)),
            cash_flow: self
                .cashflow_statement_history
                .and_then(|h| convert_statement(&h.cashflow_statements)),
        }
    }
}

// ============================================================================
// Yahoo Provider
// ============================================================================

/// Yahoo Finance fundamentals provider.
pub struct YahooProvider {
    client: reqwest::Client,
    base_url: String,
    cookie_url: String,
    crumb: Mutex<Option<String>>,
    limiter: RateLimiter,
}

impl YahooProvider {
    /// Create from provider config.
    pub fn from_config(config: &ProviderConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.as_str())
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            cookie_url: config.cookie_url.clone(),
            crumb: Mutex::new(None),
            limiter: RateLimiter::new("yahoo", config.requests_per_minute),
        })
    }

    /// Return the cached crumb, establishing a session first if needed.
    async fn crumb(&self, force_refresh: bool) -> Result<String, ProviderError> {
        let mut cached = self.crumb.lock().await;
        if !force_refresh {
            if let Some(crumb) = cached.as_ref() {
                return Ok(crumb.clone());
            }
        }

        // Only the Set-Cookie matters here; the status is usually 404.
        self.client
            .get(&self.cookie_url)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let response = self
            .client
            .get(format!("{}{}", self.base_url, CRUMB_PATH))
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(rate_limited(&response));
        }
        if !status.is_success() {
            return Err(ProviderError::Auth(format!("crumb request returned HTTP {}", status)));
        }

        let crumb = response
            .text()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?
            .trim()
            .to_string();

        if crumb.is_empty() || crumb.contains('<') {
            return Err(ProviderError::Auth("empty crumb".into()));
        }

        debug!("Obtained Yahoo crumb");
        *cached = Some(crumb.clone());
        Ok(crumb)
    }

    async fn request_summary(
        &self,
        ticker: &str,
        crumb: &str,
    ) -> Result<reqwest::Response, ProviderError> {
        self.limiter.acquire().await;

        let url = summary_url(&self.base_url, ticker)?;
        debug!(url = %url, ticker = ticker, "Fetching quoteSummary");

        self.client
            .get(url)
            .query(&[("modules", QUOTE_SUMMARY_MODULES), ("crumb", crumb)])
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))
    }
}

/// quoteSummary URL with the ticker pushed as one encoded path segment.
fn summary_url(base_url: &str, ticker: &str) -> Result<reqwest::Url, ProviderError> {
    let invalid = || ProviderError::InvalidRequest(format!("cannot build URL for {:?}", ticker));

    let mut url = reqwest::Url::parse(base_url).map_err(|_| invalid())?;
    url.path_segments_mut()
        .map_err(|_| invalid())?
        .pop_if_empty()
        .extend(["v10", "finance", "quoteSummary", ticker]);
    Ok(url)
}

fn rate_limited(response: &reqwest::Response) -> ProviderError {
    let retry_after_secs = response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok());
    ProviderError::RateLimited { retry_after_secs }
}

#[async_trait]
impl FundamentalsProvider for YahooProvider {
    fn name(&self) -> &'static str {
        "yahoo"
    }

    async fn fetch(&self, ticker: &str) -> Result<FundamentalsRecord, ProviderError> {
        if ticker.trim().is_empty() {
            return Err(ProviderError::InvalidRequest("empty ticker".into()));
        }

        let crumb = self.crumb(false).await?;
        let mut response = self.request_summary(ticker, &crumb).await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            warn!(ticker = ticker, "Yahoo rejected crumb, refreshing session");
            let crumb = self.crumb(true).await?;
            response = self.request_summary(ticker, &crumb).await?;
        }

        match response.status() {
            s if s.is_success() => {}
            StatusCode::NOT_FOUND => return Err(ProviderError::NotFound(ticker.to_string())),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(ProviderError::Auth(format!(
                    "quoteSummary returned HTTP {}",
                    response.status()
                )))
            }
            StatusCode::TOO_MANY_REQUESTS => return Err(rate_limited(&response)),
            s => return Err(ProviderError::Network(format!("HTTP {}", s))),
        }

        let envelope: QuoteSummaryEnvelope = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        if let Some(err) = envelope.quote_summary.error {
            debug!(ticker = ticker, code = %err.code, "quoteSummary error: {}", err.description);
            return Err(ProviderError::NotFound(ticker.to_string()));
        }

        let result = envelope
            .quote_summary
            .result
            .and_then(|r| r.into_iter().next())
            .ok_or_else(|| ProviderError::NotFound(ticker.to_string()))?;

        Ok(result.into_record(ticker))
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        self.crumb(false).await.map(|_| ())
    }
}
