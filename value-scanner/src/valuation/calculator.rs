//! Valuation Calculator.
//!
//! Averages three simplified fair-value heuristics and compares the price
//! against a margin-of-safety target:
//!
//! - **Graham**: `EPS × (base + 2g)`, only for positive EPS
//! - **DCF proxy**: `FCF × multiple / shares`, FCF falling back to owner earnings
//! - **Buffett**: owner earnings per share capitalized at the discount rate

use tracing::debug;
use value_common::config::ValuationConfig;

use super::statement::{
    lookup_with_fallback, CAPEX_LABELS, DEPRECIATION_LABELS, NET_INCOME_LABELS,
};
use super::types::*;

/// Owner earnings broken down into its components.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OwnerEarnings {
    pub net_income: f64,
    pub depreciation: f64,
    /// Always non-negative: the sign supplied by the provider is discarded
    pub capital_expenditure: f64,
    pub total: f64,
    pub per_share: f64,
}

/// Fair-value calculator.
#[derive(Debug, Clone, Default)]
pub struct ValuationCalculator {
    config: ValuationConfig,
}

impl ValuationCalculator {
    /// Create a calculator with the classic constants.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with custom constants.
    pub fn with_config(config: ValuationConfig) -> Self {
        Self { config }
    }

    /// Active constants.
    pub fn config(&self) -> &ValuationConfig {
        &self.config
    }

    /// Evaluate one record.
    pub fn evaluate(&self, record: &FundamentalsRecord) -> Result<ValuationResult, EvaluationError> {
        let price = match record.current_price {
            Some(p) if !p.is_finite() => {
                return Err(EvaluationError::InvalidField {
                    field: "current_price",
                })
            }
            Some(p) if p > 0.0 => p,
            _ => return Err(EvaluationError::MissingPrice),
        };

        let eps = finite_or("trailing_eps", record.trailing_eps, 0.0)?;
        let roe = finite_or("return_on_equity", record.return_on_equity, 0.0)?;
        let shares = match record.shares_outstanding {
            Some(s) => finite("shares_outstanding", s)?,
            None => {
                debug!(ticker = %record.ticker, "Shares outstanding unknown, assuming 1");
                1.0
            }
        };
        let free_cashflow = record
            .free_cashflow
            .map(|v| finite("free_cashflow", v))
            .transpose()?;

        let oe = self.owner_earnings(record, shares)?;

        let graham = finite("graham_value", self.graham_value(eps))?;
        let fcf = free_cashflow.unwrap_or(oe.total);
        let dcf = finite("dcf_value", self.dcf_value(fcf, shares))?;
        let buffett = finite("buffett_value", self.buffett_value(oe.per_share))?;

        let candidates: Vec<f64> = [graham, dcf, buffett]
            .into_iter()
            .filter(|v| *v > 0.0)
            .collect();

        if candidates.is_empty() {
            return Err(EvaluationError::NoPositiveValuation);
        }

        let fair_value = finite(
            "fair_value",
            candidates.iter().sum::<f64>() / candidates.len() as f64,
        )?;
        let target_price = fair_value * self.config.target_ratio();
        let discount_pct = finite("discount_pct", (fair_value - price) / fair_value * 100.0)?;
        let roe_pct = finite("roe_pct", roe * 100.0)?;

        let status = if price <= target_price {
            ValuationStatus::Undervalued
        } else {
            ValuationStatus::Overvalued
        };

        debug!(
            ticker = %record.ticker,
            graham,
            dcf,
            buffett,
            fair_value,
            target_price,
            status = %status,
            "Evaluated"
        );

        Ok(ValuationResult {
            ticker: record.ticker.clone(),
            current_price: price,
            graham_value: graham,
            dcf_value: dcf,
            buffett_value: buffett,
            owner_earnings: oe.total,
            fair_value,
            target_price,
            discount_pct,
            roe_pct,
            status,
            candidates_used: candidates.len(),
        })
    }

    /// Net income + depreciation − |capex|, total and per share.
    pub fn owner_earnings(
        &self,
        record: &FundamentalsRecord,
        shares: f64,
    ) -> Result<OwnerEarnings, EvaluationError> {
        let net_income = lookup_with_fallback(record.income_statement.as_ref(), NET_INCOME_LABELS);
        let depreciation = lookup_with_fallback(record.cash_flow.as_ref(), DEPRECIATION_LABELS);
        let capital_expenditure = lookup_with_fallback(record.cash_flow.as_ref(), CAPEX_LABELS).abs();

        let total = finite("owner_earnings", net_income + depreciation - capital_expenditure)?;
        let per_share = if shares > 0.0 { total / shares } else { 0.0 };

        Ok(OwnerEarnings {
            net_income,
            depreciation,
            capital_expenditure,
            total,
            per_share: finite("owner_earnings_per_share", per_share)?,
        })
    }

    /// Graham value; 0 for non-positive EPS.
    pub fn graham_value(&self, eps: f64) -> f64 {
        if eps > 0.0 {
            eps * self.config.graham_multiplier()
        } else {
            0.0
        }
    }

    /// Flat-multiple cash-flow value per share; 0 without a positive share count.
    pub fn dcf_value(&self, free_cashflow: f64, shares: f64) -> f64 {
        if shares > 0.0 {
            (free_cashflow * self.config.dcf_multiple) / shares
        } else {
            0.0
        }
    }

    /// Owner earnings per share capitalized at the discount rate; 0 when not positive.
    pub fn buffett_value(&self, owner_earnings_per_share: f64) -> f64 {
        if owner_earnings_per_share > 0.0 {
            owner_earnings_per_share / self.config.discount_rate
        } else {
            0.0
        }
    }
}

fn finite(field: &'static str, value: f64) -> Result<f64, EvaluationError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(EvaluationError::InvalidField { field })
    }
}

fn finite_or(field: &'static str, value: Option<f64>, default: f64) -> Result<f64, EvaluationError> {
    value.map_or(Ok(default), |v| finite(field, v))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::valuation::Statement;

    fn make_test_record() -> FundamentalsRecord {
        FundamentalsRecord {
            ticker: "TEST".to_string(),
            current_price: Some(100.0),
            trailing_eps: Some(5.0),
            shares_outstanding: Some(10.0),
            return_on_equity: Some(0.153),
            free_cashflow: None,
            income_statement: Some(Statement::new().with_item("Net Income", 50.0)),
            cash_flow: Some(
                Statement::new()
                    .with_item("Depreciation And Amortization", 10.0)
                    .with_item("Capital Expenditure", -5.0),
            ),
        }
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_reference_example() {
        let calc = ValuationCalculator::new();
        let result = calc.evaluate(&make_test_record()).unwrap();

        assert_eq!(result.ticker, "TEST");
        assert!(approx(result.owner_earnings, 55.0));
        assert!(approx(result.graham_value, 127.5));
        assert!(approx(result.dcf_value, 82.5));
        assert!(approx(result.buffett_value, 110.0));
        assert_eq!(result.candidates_used, 3);
        assert_eq!(result.display_fair_value(), 106.67);
        assert!(approx(result.target_price, 80.0));
        assert_eq!(result.status, ValuationStatus::Overvalued);
        assert!(approx(result.discount_pct, 6.25));
        assert_eq!(result.display_roe_pct(), 15.3);
    }

    #[test]
    fn test_extreme_price_overflowing_discount_is_rejected() {
        let calc = ValuationCalculator::new();
        let record = FundamentalsRecord {
            ticker: "HUGE".to_string(),
            current_price: Some(1e308),
            trailing_eps: Some(1e-300),
            shares_outstanding: Some(10.0),
            ..Default::default()
        };

        let err = calc.evaluate(&record).unwrap_err();
        assert!(matches!(err, EvaluationError::InvalidField { field: "discount_pct" }));
    }

    #[test]
    fn test_zero_eps_excludes_graham() {
        let calc = ValuationCalculator::new();
        let mut record = make_test_record();
        record.trailing_eps = Some(0.0);

        let result = calc.evaluate(&record).unwrap();

        assert_eq!(result.graham_value, 0.0);
        assert_eq!(result.candidates_used, 2);
        assert!(approx(result.fair_value, 96.25));
        assert_eq!(result.display_target_price(), 72.19);
        assert_eq!(result.status, ValuationStatus::Overvalued);
    }

    #[test]
    fn test_missing_price_is_rejected() {
        let calc = ValuationCalculator::new();
        let mut record = make_test_record();
        record.current_price = None;
        assert!(matches!(calc.evaluate(&record), Err(EvaluationError::MissingPrice)));

        record.current_price = Some(0.0);
        assert!(matches!(calc.evaluate(&record), Err(EvaluationError::MissingPrice)));
    }

    #[test]
    fn test_non_finite_input_is_rejected() {
        let calc = ValuationCalculator::new();
        let mut record = make_test_record();
        record.trailing_eps = Some(f64::NAN);
        assert!(matches!(
            calc.evaluate(&record),
            Err(EvaluationError::InvalidField { field: "trailing_eps" })
        ));

        let mut record = make_test_record();
        record.current_price = Some(f64::INFINITY);
        assert!(matches!(
            calc.evaluate(&record),
            Err(EvaluationError::InvalidField { field: "current_price" })
        ));
    }

    #[test]
    fn test_all_candidates_non_positive() {
        let calc = ValuationCalculator::new();
        let record = FundamentalsRecord {
            ticker: "LOSS".into(),
            current_price: Some(12.0),
            trailing_eps: Some(-1.5),
            shares_outstanding: Some(100.0),
            income_statement: Some(Statement::new().with_item("Net Income", -200.0)),
            cash_flow: Some(Statement::new().with_item("Capital Expenditure", -50.0)),
            ..Default::default()
        };

        assert!(matches!(
            calc.evaluate(&record),
            Err(EvaluationError::NoPositiveValuation)
        ));
    }

    #[test]
    fn test_free_cashflow_overrides_owner_earnings() {
        let calc = ValuationCalculator::new();
        let mut record = make_test_record();
        record.free_cashflow = Some(20.0);

        let result = calc.evaluate(&record).unwrap();
        assert!(approx(result.dcf_value, 30.0));
        // Buffett still uses owner earnings
        assert!(approx(result.buffett_value, 110.0));
    }

    #[test]
    fn test_unknown_shares_default_to_one() {
        let calc = ValuationCalculator::new();
        let mut record = make_test_record();
        record.shares_outstanding = None;

        let result = calc.evaluate(&record).unwrap();
        assert!(approx(result.dcf_value, 55.0 * 15.0));
        assert!(approx(result.buffett_value, 55.0 / 0.05));
    }

    #[test]
    fn test_zero_shares_only_graham_remains() {
        let calc = ValuationCalculator::new();
        let mut record = make_test_record();
        record.shares_outstanding = Some(0.0);

        let result = calc.evaluate(&record).unwrap();
        assert_eq!(result.dcf_value, 0.0);
        assert_eq!(result.buffett_value, 0.0);
        assert_eq!(result.candidates_used, 1);
        assert!(approx(result.fair_value, 127.5));
    }

    #[test]
    fn test_capex_sign_is_ignored() {
        let calc = ValuationCalculator::new();
        let mut positive = make_test_record();
        positive.cash_flow = Some(
            Statement::new()
                .with_item("Depreciation And Amortization", 10.0)
                .with_item("Capital Expenditure", 5.0),
        );

        let a = calc.owner_earnings(&make_test_record(), 10.0).unwrap();
        let b = calc.owner_earnings(&positive, 10.0).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.capital_expenditure, 5.0);
        assert!(approx(a.per_share, 5.5));
    }

    #[test]
    fn test_undervalued_boundary_is_inclusive() {
        let calc = ValuationCalculator::new();
        // Graham only: fair value 127.5, target 95.625
        let record = FundamentalsRecord {
            ticker: "EDGE".into(),
            current_price: Some(95.625),
            trailing_eps: Some(5.0),
            shares_outstanding: Some(0.0),
            ..Default::default()
        };

        let result = calc.evaluate(&record).unwrap();
        assert_eq!(result.target_price, 95.625);
        assert_eq!(result.status, ValuationStatus::Undervalued);
        assert!(result.is_undervalued());
    }

    #[test]
    fn test_custom_constants() {
        let calc = ValuationCalculator::with_config(ValuationConfig {
            graham_growth_rate: 5.0,
            margin_of_safety: 0.4,
            ..Default::default()
        });
        assert_eq!(calc.graham_value(2.0), 2.0 * 18.5);

        let result = calc.evaluate(&make_test_record()).unwrap();
        assert!(approx(result.target_price, result.fair_value * 0.6));
    }
}
