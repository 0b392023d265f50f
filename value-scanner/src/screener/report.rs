//! Report generation module for scan results.
//!
//! Generates reports in various formats:
//! - CSV (spreadsheet export)
//! - Markdown (console and documentation)
//! - JSON (API/programmatic use)

use anyhow::{Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::engine::{ScanResult, NO_RESULTS_MESSAGE};
use crate::valuation::{round_to, ValuationResult};

/// CSV header row.
pub const CSV_HEADERS: [&str; 10] = [
    "Ticker",
    "Price",
    "Graham Value",
    "DCF Value",
    "Buffett Value",
    "Fair Value",
    "Target Price",
    "Discount %",
    "ROE %",
    "Status",
];

// ============================================================================
// Report Format
// ============================================================================

/// Supported report formats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// Comma-separated values
    #[default]
    Csv,
    /// Markdown format (human-readable)
    Markdown,
    /// JSON format (machine-readable)
    Json,
}

impl ReportFormat {
    /// File extension used when the output path has none.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Markdown => "md",
            Self::Json => "json",
        }
    }
}

impl std::fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Csv => write!(f, "csv"),
            Self::Markdown => write!(f, "markdown"),
            Self::Json => write!(f, "json"),
        }
    }
}

impl std::str::FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "markdown" | "md" => Ok(Self::Markdown),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown report format: {}", s)),
        }
    }
}

// ============================================================================
// Scan Report
// ============================================================================

fn money(value: f64) -> String {
    format!("{:.2}", round_to(value, 2))
}

fn csv_row(r: &ValuationResult) -> [String; 10] {
    [
        r.ticker.clone(),
        money(r.current_price),
        money(r.graham_value),
        money(r.dcf_value),
        money(r.buffett_value),
        format!("{:.2}", r.display_fair_value()),
        format!("{:.2}", r.display_target_price()),
        format!("{:.1}", r.display_discount_pct()),
        format!("{:.1}", r.display_roe_pct()),
        r.status.to_string(),
    ]
}

/// Report generator for scan results.
pub struct ScanReport {
    result: ScanResult,
}

impl ScanReport {
    /// Create a new report from scan results.
    pub fn new(result: ScanResult) -> Self {
        Self { result }
    }

    /// Generate report in the specified format.
    pub fn generate(&self, format: ReportFormat) -> Result<String> {
        match format {
            ReportFormat::Csv => self.to_csv(),
            ReportFormat::Markdown => Ok(self.to_markdown()),
            ReportFormat::Json => self.to_json(),
        }
    }

    /// Save report to file, creating parent directories.
    ///
    /// The format's extension is appended when `path` has none.
    pub fn save_to_file(&self, path: &Path, format: ReportFormat) -> Result<PathBuf> {
        let content = self.generate(format)?;

        let file_path = if path.extension().is_none() {
            path.with_extension(format.extension())
        } else {
            path.to_path_buf()
        };

        if let Some(parent) = file_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).context("Failed to create report directory")?;
        }

        std::fs::write(&file_path, content)
            .with_context(|| format!("Failed to write report file {}", file_path.display()))?;

        Ok(file_path)
    }

    /// Generate CSV report: one row per valuation.
    pub fn to_csv(&self) -> Result<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(CSV_HEADERS)?;
        for r in &self.result.results {
            writer.write_record(csv_row(r))?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| anyhow::anyhow!("Failed to flush CSV writer: {}", e.error()))?;
        String::from_utf8(bytes).context("CSV output is not UTF-8")
    }

    /// Generate markdown report.
    pub fn to_markdown(&self) -> String {
        let r = &self.result;
        let mut md = String::new();

        md.push_str(&format!(
            "# Value Scan Report\n\n**Scan ID**: {}\n**Time**: {}\n**Duration**: {:.1}s\n\n",
            r.id,
            r.completed_at.format("%Y-%m-%d %H:%M:%S"),
            r.duration_secs
        ));

        md.push_str("## Summary\n\n");
        md.push_str(&format!("- **Requested**: {}\n", r.total_requested));
        md.push_str(&format!("- **Evaluated**: {}\n", r.results.len()));
        md.push_str(&format!("- **Undervalued**: {}\n", r.undervalued().len()));
        md.push_str(&format!("- **Failed**: {}\n", r.failures.len()));
        for (kind, count) in &r.failure_counts {
            md.push_str(&format!("  - {}: {}\n", kind, count));
        }
        md.push('\n');

        if r.results.is_empty() {
            md.push_str(&format!("*{}.*\n\n", NO_RESULTS_MESSAGE));
        } else {
            md.push_str("## Valuations\n\n");
            md.push_str(&format!("| {} |\n", CSV_HEADERS.join(" | ")));
            md.push_str(&format!("|{}\n", "------|".repeat(CSV_HEADERS.len())));
            for result in &r.results {
                md.push_str(&format!("| {} |\n", csv_row(result).join(" | ")));
            }
            md.push('\n');
        }

        md.push_str("---\n\n");
        md.push_str(&format!(
            "*Report generated at {} UTC*\n",
            Utc::now().format("%Y-%m-%d %H:%M:%S")
        ));

        md
    }

    /// Generate JSON report.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.result).context("Failed to serialize scan result")
    }

    /// Get the underlying result.
    pub fn result(&self) -> &ScanResult {
        &self.result
    }

    /// Get the valuations.
    pub fn results(&self) -> &[ValuationResult] {
        &self.result.results
    }
}
