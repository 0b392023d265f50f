//! Valuation types.
//!
//! Input snapshot of one security's fundamentals, the fair-value result, and
//! the reasons an evaluation can fail.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::statement::Statement;
use crate::data::ProviderError;

// ============================================================================
// Input
// ============================================================================

/// Raw fundamentals for one security, as supplied by a provider.
///
/// Numeric fields are optional because providers routinely omit them; the
/// calculator decides how each absence is treated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FundamentalsRecord {
    /// Normalized ticker (e.g. "BRK-B")
    pub ticker: String,
    /// Last traded price
    #[serde(default)]
    pub current_price: Option<f64>,
    /// Trailing twelve-month EPS
    #[serde(default)]
    pub trailing_eps: Option<f64>,
    /// Shares outstanding
    #[serde(default)]
    pub shares_outstanding: Option<f64>,
    /// Return on equity as a fraction (0.15 = 15%)
    #[serde(default)]
    pub return_on_equity: Option<f64>,
    /// Trailing free cash flow
    #[serde(default)]
    pub free_cashflow: Option<f64>,
    /// Most recent income statement
    #[serde(default)]
    pub income_statement: Option<Statement>,
    /// Most recent cash-flow statement
    #[serde(default)]
    pub cash_flow: Option<Statement>,
}

impl FundamentalsRecord {
    /// Create an empty record for a ticker.
    pub fn new(ticker: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            ..Default::default()
        }
    }
}

// ============================================================================
// Output
// ============================================================================

/// Price position relative to the margin-of-safety target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValuationStatus {
    /// Price at or below the target price
    Undervalued,
    /// Price above the target price
    Overvalued,
}

impl std::fmt::Display for ValuationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Undervalued => write!(f, "UNDERVALUED"),
            Self::Overvalued => write!(f, "OVERVALUED"),
        }
    }
}

/// Fair-value estimate for one security.
///
/// All figures are kept at full precision; use the `display_*` helpers or the
/// report module for rounded output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationResult {
    /// Ticker
    pub ticker: String,
    /// Current price
    pub current_price: f64,
    /// Graham formula value (0 when excluded)
    pub graham_value: f64,
    /// Flat-multiple free-cash-flow value per share (≤ 0 when excluded)
    pub dcf_value: f64,
    /// Capitalized owner earnings per share (0 when excluded)
    pub buffett_value: f64,
    /// Net income + D&A − |capex|
    pub owner_earnings: f64,
    /// Mean of the positive candidate values
    pub fair_value: f64,
    /// Fair value reduced by the margin of safety
    pub target_price: f64,
    /// Discount of price to fair value (%), negative when above fair value
    pub discount_pct: f64,
    /// Return on equity (%)
    pub roe_pct: f64,
    /// Undervalued / overvalued
    pub status: ValuationStatus,
    /// How many candidate values entered the mean (1-3)
    pub candidates_used: usize,
}

impl ValuationResult {
    /// Whether the price sits at or below the target price.
    pub fn is_undervalued(&self) -> bool {
        self.status == ValuationStatus::Undervalued
    }

    /// Monetary fields rounded to cents.
    pub fn display_fair_value(&self) -> f64 {
        round_to(self.fair_value, 2)
    }

    /// Target price rounded to cents.
    pub fn display_target_price(&self) -> f64 {
        round_to(self.target_price, 2)
    }

    /// Discount rounded to one decimal.
    pub fn display_discount_pct(&self) -> f64 {
        round_to(self.discount_pct, 1)
    }

    /// ROE rounded to one decimal.
    pub fn display_roe_pct(&self) -> f64 {
        round_to(self.roe_pct, 1)
    }
}

/// Round half away from zero to `decimals` places.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

// ============================================================================
// Errors
// ============================================================================

/// Why a ticker produced no valuation.
#[derive(Debug, Error)]
pub enum EvaluationError {
    /// The provider could not deliver fundamentals
    #[error("fetch failed: {0}")]
    Fetch(#[from] ProviderError),

    /// No usable current price
    #[error("missing or non-positive current price")]
    MissingPrice,

    /// A field or derived figure is not a finite number
    #[error("invalid value for {field}")]
    InvalidField { field: &'static str },

    /// Graham, DCF and Buffett values are all non-positive
    #[error("no positive valuation candidate")]
    NoPositiveValuation,
}

impl EvaluationError {
    /// Stable identifier used for failure statistics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Fetch(e) => e.kind(),
            Self::MissingPrice => "missing_price",
            Self::InvalidField { .. } => "invalid_field",
            Self::NoPositiveValuation => "no_positive_valuation",
        }
    }

    /// Whether the failure comes from the data itself rather than the provider.
    pub fn is_data_issue(&self) -> bool {
        !matches!(self, Self::Fetch(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(106.666_666, 2), 106.67);
        assert_eq!(round_to(72.1875, 2), 72.19);
        assert_eq!(round_to(6.2529, 1), 6.3);
        assert_eq!(round_to(-3.14159, 1), -3.1);
    }

    #[test]
    fn test_status_display_and_serde() {
        assert_eq!(ValuationStatus::Undervalued.to_string(), "UNDERVALUED");
        assert_eq!(
            serde_json::to_string(&ValuationStatus::Overvalued).unwrap(),
            "\"OVERVALUED\""
        );
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(EvaluationError::MissingPrice.kind(), "missing_price");
        assert_eq!(
            EvaluationError::InvalidField { field: "trailing_eps" }.kind(),
            "invalid_field"
        );
        assert_eq!(EvaluationError::NoPositiveValuation.kind(), "no_positive_valuation");

        let fetch: EvaluationError = ProviderError::NotFound("ZZZZ".into()).into();
        assert_eq!(fetch.kind(), "not_found");
        assert!(!fetch.is_data_issue());
        assert!(EvaluationError::MissingPrice.is_data_issue());
    }

    #[test]
    fn test_record_snapshot_json_is_lenient() {
        let record: FundamentalsRecord =
            serde_json::from_str(r#"{ "ticker": "KO", "current_price": 61.2 }"#).unwrap();
        assert_eq!(record.ticker, "KO");
        assert_eq!(record.current_price, Some(61.2));
        assert!(record.trailing_eps.is_none());
        assert!(record.cash_flow.is_none());
    }
}
