//! Configuration management for the value scanner.
//!
//! The scanner reads a single configuration file at `~/.valuescan/config.json`.
//!
//! # Configuration Priority
//!
//! 1. Environment variables (VALUESCAN_* prefix)
//! 2. Explicit config file values
//! 3. Default values
//!
//! # Environment Variable Mapping
//!
//! - `VALUESCAN_LOG_LEVEL` → observability.log_level
//! - `VALUESCAN_LOG_FORMAT` → observability.log_format
//! - `VALUESCAN_PORT` → server.port
//! - `VALUESCAN_BIND_ADDRESS` → server.host
//! - `VALUESCAN_PROVIDER_URL` → provider.base_url
//! - `VALUESCAN_SNAPSHOT_DIR` → provider.snapshot_dir (also switches provider.kind to snapshot)
//! - `VALUESCAN_MARGIN_OF_SAFETY` → valuation.margin_of_safety

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Get the configuration directory path.
pub fn config_dir() -> PathBuf {
    directories::UserDirs::new().map_or_else(
        || PathBuf::from(".valuescan"),
        |dirs| dirs.home_dir().join(".valuescan"),
    )
}

/// Get the configuration file path.
pub fn config_path() -> PathBuf {
    config_dir().join("config.json")
}

/// Expand `~` and environment variables in a user-supplied path.
pub fn expand_path(raw: &str) -> PathBuf {
    match shellexpand::full(raw) {
        Ok(expanded) => PathBuf::from(expanded.as_ref()),
        Err(_) => PathBuf::from(raw),
    }
}

// ============================================================================
// Valuation Configuration
// ============================================================================

/// Constants of the three fair-value heuristics and the margin of safety.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationConfig {
    /// No-growth P/E multiple of the Graham formula.
    #[serde(default = "default_graham_base_multiple")]
    pub graham_base_multiple: f64,

    /// Growth rate `g` plugged into `EPS × (base + 2g)`.
    #[serde(default = "default_graham_growth_rate")]
    pub graham_growth_rate: f64,

    /// Flat multiple applied to free cash flow in the DCF proxy.
    #[serde(default = "default_dcf_multiple")]
    pub dcf_multiple: f64,

    /// Discount rate used to capitalize owner earnings (fraction).
    #[serde(default = "default_discount_rate")]
    pub discount_rate: f64,

    /// Margin of safety applied to fair value (fraction).
    #[serde(default = "default_margin_of_safety")]
    pub margin_of_safety: f64,
}

impl ValuationConfig {
    /// Combined Graham multiplier, `base + 2 × g`.
    pub fn graham_multiplier(&self) -> f64 {
        self.graham_base_multiple + 2.0 * self.graham_growth_rate
    }

    /// Fraction of fair value at which a security counts as undervalued.
    pub fn target_ratio(&self) -> f64 {
        1.0 - self.margin_of_safety
    }
}

impl Default for ValuationConfig {
    fn default() -> Self {
        Self {
            graham_base_multiple: default_graham_base_multiple(),
            graham_growth_rate: default_graham_growth_rate(),
            dcf_multiple: default_dcf_multiple(),
            discount_rate: default_discount_rate(),
            margin_of_safety: default_margin_of_safety(),
        }
    }
}

// ============================================================================
// Provider Configuration
// ============================================================================

/// Which fundamentals source the scanner talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Yahoo Finance quoteSummary API
    #[default]
    Yahoo,
    /// Offline JSON snapshots on disk
    Snapshot,
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Yahoo => write!(f, "yahoo"),
            Self::Snapshot => write!(f, "snapshot"),
        }
    }
}

/// Market-data provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Provider implementation
    #[serde(default)]
    pub kind: ProviderKind,

    /// API base URL
    #[serde(default = "default_provider_url")]
    pub base_url: String,

    /// URL hit once to obtain the session cookie before requesting a crumb
    #[serde(default = "default_cookie_url")]
    pub cookie_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Proactive request budget per minute
    #[serde(default = "default_requests_per_minute")]
    pub requests_per_minute: u32,

    /// User agent sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Directory of `<TICKER>.json` snapshots (snapshot provider only)
    #[serde(default)]
    pub snapshot_dir: Option<String>,
}

impl ProviderConfig {
    /// Resolved snapshot directory, if configured.
    pub fn snapshot_path(&self) -> Option<PathBuf> {
        self.snapshot_dir.as_deref().map(expand_path)
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: ProviderKind::default(),
            base_url: default_provider_url(),
            cookie_url: default_cookie_url(),
            timeout_secs: default_timeout_secs(),
            requests_per_minute: default_requests_per_minute(),
            user_agent: default_user_agent(),
            snapshot_dir: None,
        }
    }
}

// ============================================================================
// Report Configuration
// ============================================================================

/// Report output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Default output file for batch scans
    #[serde(default = "default_output_path")]
    pub output_path: String,

    /// Default report format (csv, markdown, json)
    #[serde(default = "default_report_format")]
    pub format: String,

    /// Sort rows by discount to fair value, deepest discount first
    #[serde(default = "default_true")]
    pub sort_by_discount: bool,
}

impl ReportConfig {
    /// Resolved output path.
    pub fn output(&self) -> PathBuf {
        expand_path(&self.output_path)
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_path: default_output_path(),
            format: default_report_format(),
            sort_by_discount: true,
        }
    }
}

// ============================================================================
// Server Configuration
// ============================================================================

/// HTTP API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address. Default "127.0.0.1" (local only)
    #[serde(default = "default_bind_address")]
    pub host: String,

    /// Listen port
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_bind_address(),
            port: default_port(),
        }
    }
}

// ============================================================================
// Observability Configuration
// ============================================================================

/// Observability configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level", alias = "level")]
    pub log_level: String,

    /// Log format (json, pretty)
    #[serde(default = "default_log_format", alias = "format")]
    pub log_format: String,

    /// Additional module targets to silence down to `warn`.
    #[serde(default)]
    pub excluded_targets: Vec<String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
            excluded_targets: Vec::new(),
        }
    }
}

// ============================================================================
// Root Configuration
// ============================================================================

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Fair-value constants
    #[serde(default)]
    pub valuation: ValuationConfig,

    /// Fundamentals provider
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Report output
    #[serde(default)]
    pub report: ReportConfig,

    /// HTTP API
    #[serde(default)]
    pub server: ServerConfig,

    /// Logging
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Load configuration from the default path.
    pub fn load() -> Result<Self> {
        let path = config_path();
        if !path.exists() {
            tracing::info!("Config file not found, using defaults");
            return Ok(Self::default());
        }

        Self::load_from(&path)
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))
    }

    /// Load configuration (default path or `path`) with environment overrides.
    pub fn load_with_env(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::load_from(p)?,
            None => Self::load()?,
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides to the configuration.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary key lookup.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(level) = lookup("VALUESCAN_LOG_LEVEL") {
            self.observability.log_level = level;
        }
        if let Some(format) = lookup("VALUESCAN_LOG_FORMAT") {
            self.observability.log_format = format;
        }

        if let Some(port) = lookup("VALUESCAN_PORT") {
            match port.parse() {
                Ok(p) => self.server.port = p,
                Err(_) => tracing::warn!(value = %port, "Ignoring invalid VALUESCAN_PORT"),
            }
        }
        if let Some(bind) = lookup("VALUESCAN_BIND_ADDRESS") {
            self.server.host = bind;
        }

        if let Some(url) = lookup("VALUESCAN_PROVIDER_URL") {
            self.provider.base_url = url;
        }
        if let Some(dir) = lookup("VALUESCAN_SNAPSHOT_DIR") {
            self.provider.snapshot_dir = Some(dir);
            self.provider.kind = ProviderKind::Snapshot;
        }

        if let Some(mos) = lookup("VALUESCAN_MARGIN_OF_SAFETY") {
            match mos.parse() {
                Ok(m) => self.valuation.margin_of_safety = m,
                Err(_) => {
                    tracing::warn!(value = %mos, "Ignoring invalid VALUESCAN_MARGIN_OF_SAFETY")
                }
            }
        }
    }

    /// Address the HTTP API binds to.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn default_graham_base_multiple() -> f64 {
    8.5
}
fn default_graham_growth_rate() -> f64 {
    8.5
}
fn default_dcf_multiple() -> f64 {
    15.0
}
fn default_discount_rate() -> f64 {
    0.05
}
fn default_margin_of_safety() -> f64 {
    0.25
}
fn default_provider_url() -> String {
    "https://query2.finance.yahoo.com".into()
}
fn default_cookie_url() -> String {
    "https://fc.yahoo.com".into()
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_requests_per_minute() -> u32 {
    60
}
fn default_user_agent() -> String {
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7)".into()
}
fn default_output_path() -> String {
    "value_report.csv".into()
}
fn default_report_format() -> String {
    "csv".into()
}
fn default_bind_address() -> String {
    "127.0.0.1".into()
}
fn default_port() -> u16 {
    4450
}
fn default_log_level() -> String {
    "info".into()
}
fn default_log_format() -> String {
    "pretty".into()
}
fn default_true() -> bool {
    true
}
