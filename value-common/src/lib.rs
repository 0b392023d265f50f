//! Value Common - configuration, logging and error types for the value scanner.
//!
//! This crate provides:
//! - Configuration types and loading (`~/.valuescan/config.json` + env overrides)
//! - Configuration validation
//! - Error types and handling utilities
//! - Logging setup

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod config;
pub mod error;
pub mod logging;
pub mod validation;

pub use config::{
    Config, ObservabilityConfig, ProviderConfig, ProviderKind, ReportConfig, ServerConfig,
    ValuationConfig,
};
pub use error::{Error, Result, ResultExt};
pub use logging::LogFormat;
pub use validation::{Validate, ValidationError, ValidationResult};
