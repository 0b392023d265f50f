//! Ticker list input.
//!
//! Batch input is a CSV file with a `Ticker` column (header matched
//! case-insensitively) or, failing that, the first column.

use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use tracing::debug;
use value_common::error::{Error, Result, ResultExt};

use crate::data::normalize_ticker;

/// Header name of the ticker column.
pub const TICKER_COLUMN: &str = "ticker";

/// Load and normalize tickers from a CSV file.
pub fn load_tickers(path: &Path) -> Result<Vec<String>> {
    let file = File::open(path).context(format!("Failed to open ticker file '{}'", path.display()))?;
    parse_tickers(file).map_err(|e| e.with_context(format!("Failed to read '{}'", path.display())))
}

/// Parse tickers from CSV content.
///
/// Blank cells are dropped, tickers are normalized and duplicates are
/// removed keeping the first occurrence.
pub fn parse_tickers<R: Read>(reader: R) -> Result<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| Error::InvalidInput(format!("Failed to read CSV headers: {}", e)))?
        .clone();

    let column = headers
        .iter()
        .position(|h| h.trim_start_matches('\u{feff}').eq_ignore_ascii_case(TICKER_COLUMN))
        .unwrap_or(0);

    debug!(column = column, headers = headers.len(), "Resolved ticker column");

    let mut tickers = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        // records() starts after the header, CSV lines are 1-based
        let line = idx + 2;
        let record = record.map_err(|e| Error::Csv {
            line,
            message: e.to_string(),
        })?;

        if let Some(ticker) = record.get(column).and_then(normalize_ticker) {
            tickers.push(ticker);
        }
    }

    Ok(dedupe_tickers(tickers))
}

/// Normalize a list of raw tickers and drop blanks and duplicates.
pub fn normalize_all<I, S>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    dedupe_tickers(raw.into_iter().filter_map(|t| normalize_ticker(t.as_ref())))
}

/// Remove duplicates, keeping first-occurrence order.
pub fn dedupe_tickers<I: IntoIterator<Item = String>>(tickers: I) -> Vec<String> {
    let mut seen = HashSet::new();
    tickers.into_iter().filter(|t| seen.insert(t.clone())).collect()
}
