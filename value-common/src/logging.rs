//! Logging setup.
//!
//! Logs go to stderr, pretty or as JSON lines, so reports printed on stdout
//! can be piped cleanly. HTTP plumbing crates are capped at `warn` and
//! `RUST_LOG`, when set, replaces the configured filter entirely.

use std::str::FromStr;

use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use crate::config::ObservabilityConfig;

/// Library targets capped at `warn`.
pub const NOISY_MODULES: &[&str] = &[
    "hyper",
    "hyper_util",
    "reqwest",
    "h2",
    "rustls",
    "cookie_store",
    "tower_http",
];

/// Output format of the log layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(format!("Unknown log format: {}", other)),
        }
    }
}

/// Filter directives: base level, then `target=warn` for every quiet target.
fn filter_directives(log_level: &str, excluded_targets: &[String]) -> String {
    std::iter::once(log_level.to_string())
        .chain(
            NOISY_MODULES
                .iter()
                .map(|m| m.to_string())
                .chain(excluded_targets.iter().cloned())
                .map(|target| format!("{}=warn", target)),
        )
        .collect::<Vec<_>>()
        .join(",")
}

fn build_filter(log_level: &str, excluded_targets: &[String]) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directives(log_level, excluded_targets)))
}

/// Initialize logging from the observability section of the config.
///
/// Unknown format names fall back to pretty output.
pub fn init_from_config(config: &ObservabilityConfig) {
    init_logging(
        &config.log_level,
        config.log_format.parse().unwrap_or_default(),
        &config.excluded_targets,
    );
}

/// Install the global subscriber. Returns false if one was already set.
pub fn init_logging(log_level: &str, format: LogFormat, excluded_targets: &[String]) -> bool {
    let registry = tracing_subscriber::registry().with(build_filter(log_level, excluded_targets));

    let installed = match format {
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_span_events(FmtSpan::CLOSE)
                    .with_current_span(true),
            )
            .try_init()
            .is_ok(),
        LogFormat::Pretty => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false),
            )
            .try_init()
            .is_ok(),
    };

    if installed {
        tracing::debug!(level = %log_level, format = ?format, "Logging initialized");
    }
    installed
}
