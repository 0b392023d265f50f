//! Batch Screener Module.
//!
//! Reads a ticker list, evaluates each ticker and exports the results.
//!
//! # Flow
//!
//! ```text
//!  tickers.csv ──▶ input::load_tickers ──▶ ScreenerEngine::run ──▶ ScanReport
//!                                              │                      │
//!                                   FundamentalsProvider      csv / md / json
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use value_scanner::screener::{load_tickers, ReportFormat, ScanReport, ScreenerEngine};
//!
//! let tickers = load_tickers(Path::new("tickers.csv"))?;
//! let engine = ScreenerEngine::new(provider, &config.valuation);
//!
//! let mut scan = engine.run(&tickers).await;
//! scan.sort_by_discount();
//! ScanReport::new(scan).save_to_file(Path::new("value_report"), ReportFormat::Csv)?;
//! ```

pub mod engine;
pub mod input;
pub mod report;

pub use engine::{ScanFailure, ScanResult, ScreenerEngine, NO_RESULTS_MESSAGE};
pub use input::{dedupe_tickers, load_tickers, normalize_all, parse_tickers};
pub use report::{ReportFormat, ScanReport};
