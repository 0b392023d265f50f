//! Financial statement tables and label-synonym lookup.
//!
//! Providers label the same line item differently ("Capital Expenditure",
//! "Capital Expenditures", "CapEx", ...). The calculator reads statement values
//! through [`lookup_with_fallback`], which walks a priority list of labels
//! against any table implementing [`LineItems`].

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Income-statement labels for net income, in priority order.
pub const NET_INCOME_LABELS: &[&str] = &["Net Income", "Net Income Common Stockholders"];

/// Cash-flow labels for depreciation and amortization, in priority order.
pub const DEPRECIATION_LABELS: &[&str] = &["Depreciation And Amortization", "Depreciation"];

/// Cash-flow labels for capital expenditure, in priority order.
pub const CAPEX_LABELS: &[&str] = &["Capital Expenditure", "Capital Expenditures", "CapEx"];

/// A key/value view over one period of a financial statement.
pub trait LineItems {
    /// Value for an exact label, if present.
    fn line_item(&self, label: &str) -> Option<f64>;

    /// Whether the table holds no line items at all.
    fn is_empty(&self) -> bool;
}

/// One period (the most recent) of an income statement or cash-flow statement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    /// Fiscal period end date
    #[serde(default)]
    pub period_end: Option<NaiveDate>,
    /// Line items keyed by label
    #[serde(default)]
    pub items: BTreeMap<String, f64>,
}

impl Statement {
    /// Create an empty statement.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with_item(mut self, label: impl Into<String>, value: f64) -> Self {
        self.items.insert(label.into(), value);
        self
    }

    /// Set the period end date.
    pub fn with_period_end(mut self, period_end: NaiveDate) -> Self {
        self.period_end = Some(period_end);
        self
    }

    /// Insert or replace a line item.
    pub fn insert(&mut self, label: impl Into<String>, value: f64) {
        self.items.insert(label.into(), value);
    }
}

impl LineItems for Statement {
    fn line_item(&self, label: &str) -> Option<f64> {
        self.items.get(label).copied()
    }

    fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl LineItems for BTreeMap<String, f64> {
    fn line_item(&self, label: &str) -> Option<f64> {
        self.get(label).copied()
    }

    fn is_empty(&self) -> bool {
        BTreeMap::is_empty(self)
    }
}

impl LineItems for HashMap<String, f64> {
    fn line_item(&self, label: &str) -> Option<f64> {
        self.get(label).copied()
    }

    fn is_empty(&self) -> bool {
        HashMap::is_empty(self)
    }
}

/// Return the value of the first label present in `table`.
///
/// Yields `0.0` when the table is absent, empty, or has none of the labels.
pub fn lookup_with_fallback<T>(table: Option<&T>, ordered_keys: &[&str]) -> f64
where
    T: LineItems + ?Sized,
{
    let Some(table) = table else {
        return 0.0;
    };
    if table.is_empty() {
        return 0.0;
    }

    ordered_keys
        .iter()
        .find_map(|key| table.line_item(key))
        .unwrap_or(0.0)
}
