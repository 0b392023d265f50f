//! Error types shared by the value scanner crates.
//!
//! Covers infrastructure failures outside the per-ticker valuation path:
//! reading ticker lists and invalid user input.

use thiserror::Error;

/// Result type alias using the common error type.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Invalid input or request
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A CSV row that could not be read
    #[error("Malformed CSV at line {line}: {message}")]
    Csv { line: usize, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error wrapped with what was being attempted
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Wrap this error with additional context.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        Self::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error, with all context layers removed.
    pub fn root(&self) -> &Error {
        match self {
            Self::WithContext { source, .. } => source.root(),
            other => other,
        }
    }

    /// Stable identifier for the root cause.
    pub fn kind(&self) -> &'static str {
        match self.root() {
            Self::InvalidInput(_) => "invalid_input",
            Self::Csv { .. } => "csv",
            Self::Io(_) => "io",
            Self::WithContext { .. } => "context",
        }
    }
}

/// Adds `.context(...)` to results whose error converts into [`Error`].
pub trait ResultExt<T> {
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.into().with_context(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_chain_keeps_root_kind() {
        let err = Error::Csv {
            line: 7,
            message: "unequal lengths".into(),
        }
        .with_context("parsing rows")
        .with_context("loading tickers.csv");

        assert_eq!(err.kind(), "csv");
        assert!(matches!(err.root(), Error::Csv { line: 7, .. }));
        assert_eq!(
            err.to_string(),
            "loading tickers.csv: parsing rows: Malformed CSV at line 7: unequal lengths"
        );
    }

    #[test]
    fn test_result_ext_wraps_io_error() {
        let res: std::result::Result<(), std::io::Error> = Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "missing",
        ));
        let err = res.context("reading tickers").unwrap_err();
        assert_eq!(err.kind(), "io");
        assert!(err.to_string().starts_with("reading tickers: IO error"));
    }
}
