//! Value Scanner Library
//!
//! Screens equities for value opportunities by comparing the current price
//! with a margin-of-safety target derived from three fair-value heuristics.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                    value-scanner (:4450)                         │
//! ├──────────────────────────────────────────────────────────────────┤
//! │  ┌────────────────┐   ┌────────────────┐   ┌────────────────┐    │
//! │  │  data          │──▶│  valuation     │──▶│  screener      │    │
//! │  │  Yahoo /       │   │  Graham, DCF,  │   │  batch, sort,  │    │
//! │  │  snapshots     │   │  Buffett       │   │  csv/md/json   │    │
//! │  └────────────────┘   └────────────────┘   └────────────────┘    │
//! │            CLI (scan, evaluate, fetch)   HTTP API (serve)        │
//! └──────────────────────────────────────────────────────────────────┘
//! ```

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod data;
pub mod routes;
pub mod screener;
pub mod valuation;

use anyhow::Result;
use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use value_common::config::Config;

use crate::data::FundamentalsProvider;
use crate::screener::ScreenerEngine;

/// Scanner service state
pub struct ScannerState {
    /// Configuration
    pub config: Config,
    /// Batch engine wrapping the configured provider
    pub engine: ScreenerEngine<dyn FundamentalsProvider>,
}

impl ScannerState {
    /// Create state with the provider selected by config.
    pub fn new(config: Config) -> Result<Self> {
        let provider = data::create_provider(&config.provider)?;
        Ok(Self::with_provider(config, provider))
    }

    /// Create state around an existing provider.
    pub fn with_provider(config: Config, provider: Arc<dyn FundamentalsProvider>) -> Self {
        let engine = ScreenerEngine::new(provider, &config.valuation);
        Self { config, engine }
    }
}

/// Build the HTTP router.
pub fn build_router(state: Arc<ScannerState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(routes::health))
        .route("/api/v1/valuation/:ticker", get(routes::get_valuation))
        .route("/api/v1/scan", post(routes::scan))
        .route("/api/v1/config", get(routes::get_config))
        .layer(cors)
        .with_state(state)
}

/// HTTP front end for interactive lookups
pub struct ScannerService {
    state: Arc<ScannerState>,
}

impl ScannerService {
    /// Create a new scanner service
    pub fn new(config: Config) -> Result<Self> {
        Ok(Self {
            state: Arc::new(ScannerState::new(config)?),
        })
    }

    /// Start the HTTP server; returns on Ctrl-C.
    pub async fn start(self) -> Result<()> {
        let addr: SocketAddr = self.state.config.bind_address().parse()?;
        let app = build_router(Arc::clone(&self.state));

        tracing::info!(address = %addr, "Starting HTTP server");

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
