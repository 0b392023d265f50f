//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use value_scanner::data::{FundamentalsProvider, ProviderError};
use value_scanner::valuation::{FundamentalsRecord, Statement};

/// In-memory provider with scripted failures.
#[derive(Default)]
pub struct MockProvider {
    records: HashMap<String, FundamentalsRecord>,
    errors: HashMap<String, ProviderError>,
    calls: AtomicU32,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(mut self, record: FundamentalsRecord) -> Self {
        self.records.insert(record.ticker.clone(), record);
        self
    }

    pub fn with_error(mut self, ticker: &str, error: ProviderError) -> Self {
        self.errors.insert(ticker.to_string(), error);
        self
    }

    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl FundamentalsProvider for MockProvider {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn fetch(&self, ticker: &str) -> Result<FundamentalsRecord, ProviderError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        if let Some(err) = self.errors.get(ticker) {
            return Err(err.clone());
        }
        self.records
            .get(ticker)
            .cloned()
            .ok_or_else(|| ProviderError::NotFound(ticker.to_string()))
    }
}

/// price=100, eps=5, shares=10, net income=50, D&A=10, capex=-5.
///
/// Evaluates to graham 127.5, dcf 82.5, buffett 110, fair ≈ 106.67.
pub fn reference_record(ticker: &str, price: f64) -> FundamentalsRecord {
    FundamentalsRecord {
        ticker: ticker.to_string(),
        current_price: Some(price),
        trailing_eps: Some(5.0),
        shares_outstanding: Some(10.0),
        return_on_equity: Some(0.15),
        free_cashflow: None,
        income_statement: Some(Statement::new().with_item("Net Income", 50.0)),
        cash_flow: Some(
            Statement::new()
                .with_item("Depreciation And Amortization", 10.0)
                .with_item("Capital Expenditure", -5.0),
        ),
    }
}
