//! Data Module.
//!
//! Fetches per-ticker fundamentals through the `FundamentalsProvider` trait.
//!
//! # Providers
//! - **Yahoo**: live quoteSummary API (cookie + crumb session, rate limited)
//! - **Snapshot**: JSON files on disk, written by `value-scanner fetch`

pub mod provider;
pub mod rate_limiter;
pub mod snapshot;
pub mod yahoo;

pub use provider::{FundamentalsProvider, ProviderError};
pub use rate_limiter::RateLimiter;
pub use snapshot::{write_snapshot, SnapshotProvider};
pub use yahoo::YahooProvider;

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

use value_common::config::{ProviderConfig, ProviderKind};

/// Normalize a user-supplied ticker.
///
/// Trims whitespace, uppercases, and maps share-class dots to dashes
/// (`brk.b` -> `BRK-B`). Returns `None` for blank input.
pub fn normalize_ticker(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.to_uppercase().replace('.', "-"))
}

/// Build the provider selected by config.
pub fn create_provider(config: &ProviderConfig) -> Result<Arc<dyn FundamentalsProvider>> {
    let provider: Arc<dyn FundamentalsProvider> = match config.kind {
        ProviderKind::Yahoo => Arc::new(YahooProvider::from_config(config)?),
        ProviderKind::Snapshot => {
            let dir = config
                .snapshot_path()
                .context("provider.snapshot_dir is required for the snapshot provider")?;
            Arc::new(SnapshotProvider::new(dir))
        }
    };

    info!(provider = provider.name(), "Fundamentals provider ready");
    Ok(provider)
}
