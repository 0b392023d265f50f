//! Fundamentals provider abstraction.
//!
//! Defines the `FundamentalsProvider` trait that every data source
//! implements, so the screener can run against Yahoo Finance, offline
//! snapshots or a test double without change.

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

use crate::valuation::FundamentalsRecord;

// ============================================================================
// Provider Error
// ============================================================================

/// Errors specific to data providers.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// Network error (connection failed, timeout, unexpected HTTP status)
    Network(String),
    /// Authentication error (cookie or crumb rejected)
    Auth(String),
    /// Rate limit exceeded
    RateLimited { retry_after_secs: Option<u64> },
    /// The provider has no data for this ticker
    NotFound(String),
    /// The response could not be understood
    InvalidResponse(String),
    /// Invalid request parameters
    InvalidRequest(String),
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network(msg) => write!(f, "Network error: {}", msg),
            Self::Auth(msg) => write!(f, "Authentication error: {}", msg),
            Self::RateLimited { retry_after_secs } => {
                write!(f, "Rate limited")?;
                if let Some(secs) = retry_after_secs {
                    write!(f, ", retry after {} seconds", secs)?;
                }
                Ok(())
            }
            Self::NotFound(ticker) => write!(f, "No data for {}", ticker),
            Self::InvalidResponse(msg) => write!(f, "Invalid response: {}", msg),
            Self::InvalidRequest(msg) => write!(f, "Invalid request: {}", msg),
        }
    }
}

impl std::error::Error for ProviderError {}

impl ProviderError {
    /// Stable identifier used for failure statistics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Network(_) => "network",
            Self::Auth(_) => "auth",
            Self::RateLimited { .. } => "rate_limited",
            Self::NotFound(_) => "not_found",
            Self::InvalidResponse(_) => "invalid_response",
            Self::InvalidRequest(_) => "invalid_request",
        }
    }
}

// ============================================================================
// Provider Trait
// ============================================================================

/// Source of per-ticker fundamentals.
#[async_trait]
pub trait FundamentalsProvider: Send + Sync {
    /// Provider name (e.g. "yahoo", "snapshot")
    fn name(&self) -> &'static str;

    /// Fetch the fundamentals snapshot for a normalized ticker.
    async fn fetch(&self, ticker: &str) -> Result<FundamentalsRecord, ProviderError>;

    /// Lightweight availability check.
    async fn health_check(&self) -> Result<(), ProviderError> {
        Ok(())
    }
}

#[async_trait]
impl<P: FundamentalsProvider + ?Sized> FundamentalsProvider for Arc<P> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    async fn fetch(&self, ticker: &str) -> Result<FundamentalsRecord, ProviderError> {
        (**self).fetch(ticker).await
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        (**self).health_check().await
    }
}

// ============================================================================
// Tests
// ============================================================================
