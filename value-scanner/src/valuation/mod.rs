//! Valuation Module.
//!
//! Computes a margin-of-safety fair value from three simplified heuristics.
//!
//! # The Three Candidates
//!
//! 1. **Graham**: `EPS × (8.5 + 2g)` with `g = 8.5`, i.e. `EPS × 25.5`
//! 2. **DCF proxy**: free cash flow (or owner earnings) × 15 per share
//! 3. **Buffett**: owner earnings per share capitalized at 5%
//!
//! Only strictly positive candidates enter the mean. The target price is the
//! fair value less a 25% margin of safety; a security at or below it is
//! flagged as undervalued.
//!
//! # Usage
//!
//! ```ignore
//! use value_scanner::valuation::{FundamentalsRecord, ValuationCalculator};
//!
//! let calculator = ValuationCalculator::new();
//! let record = FundamentalsRecord {
//!     ticker: "KO".to_string(),
//!     current_price: Some(61.2),
//!     trailing_eps: Some(2.47),
//!     // ... other fields
//!     ..Default::default()
//! };
//!
//! match calculator.evaluate(&record) {
//!     Ok(result) => println!("{}: fair value {:.2} ({})", result.ticker, result.fair_value, result.status),
//!     Err(e) => println!("no result: {}", e),
//! }
//! ```

pub mod calculator;
pub mod statement;
pub mod types;

pub use calculator::{OwnerEarnings, ValuationCalculator};
pub use statement::{
    lookup_with_fallback, LineItems, Statement, CAPEX_LABELS, DEPRECIATION_LABELS,
    NET_INCOME_LABELS,
};
pub use types::{round_to, EvaluationError, FundamentalsRecord, ValuationResult, ValuationStatus};
