//! Configuration validation.
//!
//! Checks that every configuration section holds values the scanner can
//! actually work with before any ticker is fetched.

use thiserror::Error;

use crate::config::{
    Config, ObservabilityConfig, ProviderConfig, ProviderKind, ReportConfig, ServerConfig,
    ValuationConfig,
};
use crate::logging::LogFormat;

/// Configuration validation error.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid port {port}: must be between 1 and 65535")]
    InvalidPort { port: u16, field: String },

    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Multiple validation errors: {0:?}")]
    Multiple(Vec<ValidationError>),
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Trait for validatable configuration sections.
pub trait Validate {
    /// Validate this configuration section.
    fn validate(&self) -> ValidationResult<()>;
}

impl Config {
    /// Validate the entire configuration.
    pub fn validate(&self) -> ValidationResult<()> {
        let mut errors: Vec<ValidationError> = [
            self.valuation.validate(),
            self.provider.validate(),
            self.report.validate(),
            self.server.validate(),
            self.observability.validate(),
        ]
        .into_iter()
        .filter_map(Result::err)
        .collect();

        if errors.is_empty() {
            Ok(())
        } else if errors.len() == 1 {
            Err(errors.remove(0))
        } else {
            Err(ValidationError::Multiple(errors))
        }
    }

    /// Load (default path or `path`), apply env overrides, and validate.
    pub fn load_and_validate(path: Option<&std::path::Path>) -> anyhow::Result<Self> {
        let config = Self::load_with_env(path)?;
        config.validate().map_err(|e| anyhow::anyhow!("{}", e))?;
        Ok(config)
    }
}

fn invalid(field: &str, reason: &str) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.into(),
        reason: reason.into(),
    }
}

impl Validate for ValuationConfig {
    fn validate(&self) -> ValidationResult<()> {
        let mut errors = Vec::new();

        if !self.graham_base_multiple.is_finite() || self.graham_base_multiple < 0.0 {
            errors.push(invalid("valuation.graham_base_multiple", "must be a non-negative number"));
        }
        if !self.graham_growth_rate.is_finite() {
            errors.push(invalid("valuation.graham_growth_rate", "must be a finite number"));
        }
        if !self.dcf_multiple.is_finite() || self.dcf_multiple <= 0.0 {
            errors.push(invalid("valuation.dcf_multiple", "must be greater than 0"));
        }
        if !self.discount_rate.is_finite() || self.discount_rate <= 0.0 {
            errors.push(invalid("valuation.discount_rate", "must be greater than 0"));
        }
        if !(0.0..1.0).contains(&self.margin_of_safety) {
            errors.push(invalid("valuation.margin_of_safety", "must be in [0, 1)"));
        }

        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.remove(0)),
            _ => Err(ValidationError::Multiple(errors)),
        }
    }
}

impl Validate for ProviderConfig {
    fn validate(&self) -> ValidationResult<()> {
        if self.timeout_secs == 0 {
            return Err(invalid("provider.timeout_secs", "must be greater than 0"));
        }
        if self.requests_per_minute == 0 {
            return Err(invalid("provider.requests_per_minute", "must be greater than 0"));
        }

        match self.kind {
            ProviderKind::Yahoo => {
                if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
                    return Err(invalid("provider.base_url", "must be an http(s) URL"));
                }
            }
            ProviderKind::Snapshot => {
                if self.snapshot_dir.as_deref().map_or(true, str::is_empty) {
                    return Err(ValidationError::MissingField {
                        field: "provider.snapshot_dir".into(),
                    });
                }
            }
        }

        Ok(())
    }
}

impl Validate for ReportConfig {
    fn validate(&self) -> ValidationResult<()> {
        match self.format.to_lowercase().as_str() {
            "csv" | "markdown" | "md" | "json" => Ok(()),
            _ => Err(invalid("report.format", "must be one of: csv, markdown, json")),
        }
    }
}

impl Validate for ServerConfig {
    fn validate(&self) -> ValidationResult<()> {
        if self.port == 0 {
            return Err(ValidationError::InvalidPort {
                port: self.port,
                field: "server.port".into(),
            });
        }
        if self.host.trim().is_empty() {
            return Err(ValidationError::MissingField {
                field: "server.host".into(),
            });
        }
        Ok(())
    }
}

impl Validate for ObservabilityConfig {
    fn validate(&self) -> ValidationResult<()> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(invalid(
                "observability.log_level",
                "must be one of: trace, debug, info, warn, error",
            ));
        }

        if self.log_format.parse::<LogFormat>().is_err() {
            return Err(invalid("observability.log_format", "must be one of: json, pretty"));
        }

        Ok(())
    }
}
