//! Offline snapshot provider.
//!
//! Reads one JSON-serialized `FundamentalsRecord` per ticker from
//! `<dir>/<TICKER>.json`. Snapshots are written by `value-scanner fetch`
//! and allow repeatable scans without network access.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::provider::{FundamentalsProvider, ProviderError};
use crate::valuation::FundamentalsRecord;

/// Provider backed by a directory of JSON snapshots.
#[derive(Debug, Clone)]
pub struct SnapshotProvider {
    dir: PathBuf,
}

impl SnapshotProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the snapshot file for a ticker.
    pub fn snapshot_file(&self, ticker: &str) -> PathBuf {
        snapshot_file(&self.dir, ticker)
    }
}

fn snapshot_file(dir: &Path, ticker: &str) -> PathBuf {
    dir.join(format!("{}.json", ticker))
}

#[async_trait]
impl FundamentalsProvider for SnapshotProvider {
    fn name(&self) -> &'static str {
        "snapshot"
    }

    async fn fetch(&self, ticker: &str) -> Result<FundamentalsRecord, ProviderError> {
        if ticker.is_empty() || ticker.contains(['/', '\\']) || ticker.starts_with('.') {
            return Err(ProviderError::InvalidRequest(format!("invalid ticker: {:?}", ticker)));
        }

        let path = self.snapshot_file(ticker);
        debug!(path = %path.display(), "Reading snapshot");

        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ProviderError::NotFound(ticker.to_string()))
            }
            Err(e) => return Err(ProviderError::Network(format!("{}: {}", path.display(), e))),
        };

        let mut record: FundamentalsRecord = serde_json::from_str(&content).map_err(|e| {
            ProviderError::InvalidResponse(format!("{}: {}", path.display(), e))
        })?;

        // The file name is authoritative.
        record.ticker = ticker.to_string();
        Ok(record)
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        if self.dir.is_dir() {
            Ok(())
        } else {
            Err(ProviderError::NotFound(self.dir.display().to_string()))
        }
    }
}

/// Write a record as `<dir>/<TICKER>.json`, creating the directory if needed.
pub async fn write_snapshot(dir: &Path, record: &FundamentalsRecord) -> anyhow::Result<PathBuf> {
    tokio::fs::create_dir_all(dir).await?;
    let path = snapshot_file(dir, &record.ticker);
    let json = serde_json::to_string_pretty(record)?;
    tokio::fs::write(&path, json).await?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::valuation::Statement;
    use tempfile::TempDir;
    use tokio_test::{assert_err, assert_ok};

    #[tokio::test]
    async fn test_write_then_fetch() {
        let dir = TempDir::new().unwrap();
        let record = FundamentalsRecord {
            ticker: "KO".into(),
            current_price: Some(61.2),
            trailing_eps: Some(2.47),
            income_statement: Some(Statement::new().with_item("Net Income", 10.0)),
            ..Default::default()
        };

        let path = write_snapshot(dir.path(), &record).await.unwrap();
        assert!(path.ends_with("KO.json"));

        let provider = SnapshotProvider::new(dir.path());
        let fetched = provider.fetch("KO").await.unwrap();
        assert_eq!(fetched, record);
    }

    #[tokio::test]
    async fn test_missing_snapshot_is_not_found() {
        let dir = TempDir::new().unwrap();
        let provider = SnapshotProvider::new(dir.path());
        let err = provider.fetch("ZZZZ").await.unwrap_err();
        assert_eq!(err, ProviderError::NotFound("ZZZZ".into()));
    }

    #[tokio::test]
    async fn test_malformed_snapshot_is_invalid_response() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("BAD.json"), "{ not json").unwrap();

        let provider = SnapshotProvider::new(dir.path());
        let err = provider.fetch("BAD").await.unwrap_err();
        assert_eq!(err.kind(), "invalid_response");
    }

    #[tokio::test]
    async fn test_ticker_is_taken_from_file_name() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("BRK-B.json"), r#"{ "ticker": "x", "current_price": 1.0 }"#)
            .unwrap();

        let provider = SnapshotProvider::new(dir.path());
        assert_eq!(provider.fetch("BRK-B").await.unwrap().ticker, "BRK-B");
    }

    #[tokio::test]
    async fn test_path_traversal_rejected() {
        let dir = TempDir::new().unwrap();
        let provider = SnapshotProvider::new(dir.path());
        let err = provider.fetch("../etc/passwd").await.unwrap_err();
        assert_eq!(err.kind(), "invalid_request");
    }

    #[tokio::test]
    async fn test_health_check() {
        let dir = TempDir::new().unwrap();
        assert_ok!(SnapshotProvider::new(dir.path()).health_check().await);
        assert_err!(
            SnapshotProvider::new(dir.path().join("missing"))
                .health_check()
                .await
        );
    }
}
