//! Screener engine module.
//!
//! Drives a batch of tickers through fetch and valuation, one at a time,
//! collecting successes and counting failures by kind.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use value_common::config::ValuationConfig;

use crate::data::FundamentalsProvider;
use crate::valuation::{EvaluationError, ValuationCalculator, ValuationResult};

/// Message shown when a batch produces no valuation at all.
pub const NO_RESULTS_MESSAGE: &str = "No opportunities found";

// ============================================================================
// Scan Result
// ============================================================================

/// A ticker that produced no valuation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanFailure {
    /// Ticker
    pub ticker: String,
    /// Failure kind (e.g. "not_found", "missing_price")
    pub kind: String,
    /// Human-readable reason
    pub message: String,
}

/// Result of a batch scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanResult {
    /// Scan ID (timestamp-based)
    pub id: String,
    /// Successful valuations, in input order unless sorted
    pub results: Vec<ValuationResult>,
    /// Tickers that failed
    pub failures: Vec<ScanFailure>,
    /// Failure count per kind
    pub failure_counts: BTreeMap<String, usize>,
    /// Number of tickers requested
    pub total_requested: usize,
    /// Start time
    pub started_at: DateTime<Utc>,
    /// End time
    pub completed_at: DateTime<Utc>,
    /// Duration in seconds
    pub duration_secs: f64,
}

impl ScanResult {
    fn start(total_requested: usize) -> Self {
        let started_at = Utc::now();
        Self {
            id: format!("scan_{}", started_at.format("%Y%m%d_%H%M%S")),
            results: Vec::new(),
            failures: Vec::new(),
            failure_counts: BTreeMap::new(),
            total_requested,
            started_at,
            completed_at: started_at,
            duration_secs: 0.0,
        }
    }

    fn finish(&mut self) {
        self.completed_at = Utc::now();
        self.duration_secs =
            (self.completed_at - self.started_at).num_milliseconds() as f64 / 1000.0;
    }

    fn record_failure(&mut self, ticker: &str, error: &EvaluationError) {
        let kind = error.kind().to_string();
        *self.failure_counts.entry(kind.clone()).or_insert(0) += 1;
        self.failures.push(ScanFailure {
            ticker: ticker.to_string(),
            kind,
            message: error.to_string(),
        });
    }

    /// Whether the scan produced no valuation.
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Sort by discount percent, largest first. Ties keep input order.
    pub fn sort_by_discount(&mut self) {
        self.results.sort_by(|a, b| b.discount_pct.total_cmp(&a.discount_pct));
    }

    /// Drop every result that is not undervalued.
    pub fn retain_undervalued(&mut self) {
        self.results.retain(|r| r.is_undervalued());
    }

    /// Results flagged as undervalued.
    pub fn undervalued(&self) -> Vec<&ValuationResult> {
        self.results.iter().filter(|r| r.is_undervalued()).collect()
    }

    /// Total failures.
    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    /// Summary string for logging.
    pub fn summary(&self) -> String {
        format!(
            "Evaluated {} of {} tickers in {:.1}s: {} undervalued, {} failed",
            self.results.len(),
            self.total_requested,
            self.duration_secs,
            self.undervalued().len(),
            self.failures.len()
        )
    }
}

// ============================================================================
// Screener Engine
// ============================================================================

/// Batch valuation driver.
///
/// Tickers are processed sequentially; each waits only on its own fetch.
/// A failing ticker is logged and counted, never aborting the batch.
pub struct ScreenerEngine<P: FundamentalsProvider + ?Sized> {
    provider: Arc<P>,
    calculator: ValuationCalculator,
}

impl<P: FundamentalsProvider + ?Sized> ScreenerEngine<P> {
    /// Create a new screener engine.
    pub fn new(provider: Arc<P>, config: &ValuationConfig) -> Self {
        Self {
            provider,
            calculator: ValuationCalculator::with_config(config.clone()),
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn calculator(&self) -> &ValuationCalculator {
        &self.calculator
    }

    /// Fetch and evaluate a single ticker.
    pub async fn evaluate_ticker(&self, ticker: &str) -> Result<ValuationResult, EvaluationError> {
        let record = self.provider.fetch(ticker).await?;
        self.calculator.evaluate(&record)
    }

    /// Evaluate a batch of tickers.
    pub async fn run(&self, tickers: &[String]) -> ScanResult {
        self.run_with_progress(tickers, |_, _, _| {}).await
    }

    /// Evaluate a batch, calling `progress(done, total, ticker)` after each ticker.
    pub async fn run_with_progress<F>(&self, tickers: &[String], mut progress: F) -> ScanResult
    where
        F: FnMut(usize, usize, &str),
    {
        let mut scan = ScanResult::start(tickers.len());
        info!(
            scan_id = %scan.id,
            tickers = tickers.len(),
            provider = self.provider.name(),
            "Starting scan"
        );

        for (idx, ticker) in tickers.iter().enumerate() {
            match self.evaluate_ticker(ticker).await {
                Ok(result) => {
                    debug!(
                        ticker = %ticker,
                        fair_value = result.fair_value,
                        status = %result.status,
                        "Evaluated"
                    );
                    scan.results.push(result);
                }
                Err(e) => {
                    warn!(ticker = %ticker, kind = e.kind(), "Skipping ticker: {}", e);
                    scan.record_failure(ticker, &e);
                }
            }
            progress(idx + 1, tickers.len(), ticker);
        }

        scan.finish();
        info!(scan_id = %scan.id, failures = ?scan.failure_counts, "{}", scan.summary());
        scan
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ProviderError;
    use crate::valuation::{FundamentalsRecord, Statement, ValuationStatus};
    use async_trait::async_trait;
    use std::collections::HashMap;

    struct MapProvider(HashMap<String, FundamentalsRecord>);

    #[async_trait]
    impl FundamentalsProvider for MapProvider {
        fn name(&self) -> &'static str {
            "map"
        }

        async fn fetch(&self, ticker: &str) -> Result<FundamentalsRecord, ProviderError> {
            self.0
                .get(ticker)
                .cloned()
                .ok_or_else(|| ProviderError::NotFound(ticker.to_string()))
        }
    }

    fn record(ticker: &str, price: f64, eps: f64) -> FundamentalsRecord {
        FundamentalsRecord {
            ticker: ticker.into(),
            current_price: Some(price),
            trailing_eps: Some(eps),
            shares_outstanding: Some(10.0),
            income_statement: Some(Statement::new().with_item("Net Income", 50.0)),
            cash_flow: Some(
                Statement::new()
                    .with_item("Depreciation", 10.0)
                    .with_item("Capital Expenditure", -5.0),
            ),
            ..Default::default()
        }
    }

    fn engine(records: Vec<FundamentalsRecord>) -> ScreenerEngine<MapProvider> {
        let map = records.into_iter().map(|r| (r.ticker.clone(), r)).collect();
        ScreenerEngine::new(Arc::new(MapProvider(map)), &ValuationConfig::default())
    }

    fn tickers(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_failures_do_not_abort_batch() {
        let mut no_price = record("NOPX", 1.0, 5.0);
        no_price.current_price = None;

        let engine = engine(vec![record("AAA", 100.0, 5.0), no_price, record("BBB", 50.0, 5.0)]);
        let scan = engine.run(&tickers(&["AAA", "MISSING", "NOPX", "BBB"])).await;

        assert_eq!(scan.total_requested, 4);
        assert_eq!(scan.results.len(), 2);
        assert_eq!(scan.failure_count(), 2);
        assert_eq!(scan.failure_counts.get("not_found"), Some(&1));
        assert_eq!(scan.failure_counts.get("missing_price"), Some(&1));
        assert!(scan.id.starts_with("scan_"));
    }

    #[tokio::test]
    async fn test_all_failures_yield_empty_result() {
        let engine = engine(vec![]);
        let scan = engine.run(&tickers(&["X", "Y"])).await;
        assert!(scan.is_empty());
        assert_eq!(scan.failure_counts.get("not_found"), Some(&2));
    }

    #[tokio::test]
    async fn test_sort_by_discount_descending() {
        let engine = engine(vec![
            record("MID", 80.0, 5.0),
            record("HIGH", 100.0, 5.0),
            record("LOW", 40.0, 5.0),
        ]);
        let mut scan = engine.run(&tickers(&["MID", "HIGH", "LOW"])).await;
        assert_eq!(scan.results[0].ticker, "MID");

        scan.sort_by_discount();
        let order: Vec<_> = scan.results.iter().map(|r| r.ticker.as_str()).collect();
        assert_eq!(order, vec!["LOW", "MID", "HIGH"]);
    }

    #[tokio::test]
    async fn test_undervalued_filter() {
        let engine = engine(vec![record("CHEAP", 40.0, 5.0), record("DEAR", 100.0, 5.0)]);
        let mut scan = engine.run(&tickers(&["CHEAP", "DEAR"])).await;

        assert_eq!(scan.undervalued().len(), 1);
        scan.retain_undervalued();
        assert_eq!(scan.results.len(), 1);
        assert_eq!(scan.results[0].status, ValuationStatus::Undervalued);
    }

    #[tokio::test]
    async fn test_progress_callback() {
        let engine = engine(vec![record("AAA", 100.0, 5.0)]);
        let mut seen = Vec::new();
        engine
            .run_with_progress(&tickers(&["AAA", "BBB"]), |done, total, t| {
                seen.push((done, total, t.to_string()))
            })
            .await;
        assert_eq!(seen, vec![(1, 2, "AAA".to_string()), (2, 2, "BBB".to_string())]);
    }

    #[tokio::test]
    async fn test_evaluate_ticker_wraps_provider_error() {
        let engine = engine(vec![]);
        let err = engine.evaluate_ticker("ZZZZ").await.unwrap_err();
        assert!(matches!(err, EvaluationError::Fetch(ProviderError::NotFound(_))));
    }
}
