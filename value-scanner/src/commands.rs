//! Command handlers for the value-scanner CLI.

use anyhow::{bail, Context, Result};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use value_common::config::{Config, ProviderKind};
use value_scanner::data::{self, write_snapshot, FundamentalsProvider, YahooProvider};
use value_scanner::screener::{
    load_tickers, normalize_all, ReportFormat, ScanReport, ScreenerEngine, NO_RESULTS_MESSAGE,
};
use value_scanner::ScannerService;

/// Options for `scan`.
#[derive(Debug, Default)]
pub struct ScanOptions {
    pub tickers: Vec<String>,
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub format: Option<ReportFormat>,
    pub unsorted: bool,
    pub undervalued_only: bool,
    pub snapshots: Option<PathBuf>,
}

/// Merge command-line tickers with an optional CSV file.
///
/// Fails only when no source was given at all. A source that yields no
/// usable tickers gives an empty list.
fn collect_tickers(args: Vec<String>, input: Option<&Path>) -> Result<Vec<String>> {
    if args.is_empty() && input.is_none() {
        bail!("No tickers given; pass tickers as arguments or use --input");
    }

    let mut raw = args;
    if let Some(path) = input {
        raw.extend(load_tickers(path)?);
    }
    Ok(normalize_all(raw))
}

fn use_snapshots(config: &mut Config, dir: Option<PathBuf>) {
    if let Some(dir) = dir {
        config.provider.kind = ProviderKind::Snapshot;
        config.provider.snapshot_dir = Some(dir.to_string_lossy().into_owned());
    }
}

/// Evaluate a batch and write the report.
pub async fn scan(mut config: Config, options: ScanOptions) -> Result<()> {
    let tickers = collect_tickers(options.tickers, options.input.as_deref())?;
    if tickers.is_empty() {
        warn!("Ticker list is empty after normalization");
        println!("{}", NO_RESULTS_MESSAGE);
        return Ok(());
    }
    use_snapshots(&mut config, options.snapshots);

    let format = match options.format {
        Some(f) => f,
        None => config
            .report
            .format
            .parse::<ReportFormat>()
            .map_err(anyhow::Error::msg)?,
    };

    let provider = data::create_provider(&config.provider)?;
    let engine = ScreenerEngine::new(provider, &config.valuation);

    let interactive = std::io::stderr().is_terminal();
    let mut result = engine
        .run_with_progress(&tickers, |done, total, ticker| {
            if interactive {
                eprint!("\r[{}/{}] {:<12}", done, total, ticker);
                if done == total {
                    eprintln!();
                }
            }
        })
        .await;

    if options.undervalued_only {
        result.retain_undervalued();
    }
    if config.report.sort_by_discount && !options.unsorted {
        result.sort_by_discount();
    }

    if result.is_empty() {
        println!("{}", NO_RESULTS_MESSAGE);
        return Ok(());
    }

    let report = ScanReport::new(result);
    println!("{}", report.to_markdown());

    let output = options.output.unwrap_or_else(|| config.report.output());
    let path = report.save_to_file(&output, format)?;
    info!(path = %path.display(), format = %format, "Report saved");
    println!("Report saved to {}", path.display());

    Ok(())
}

/// Evaluate a single ticker and print it as JSON.
pub async fn evaluate(mut config: Config, ticker: &str, snapshots: Option<PathBuf>) -> Result<()> {
    let ticker = data::normalize_ticker(ticker).context("Ticker must not be empty")?;
    use_snapshots(&mut config, snapshots);

    let provider = data::create_provider(&config.provider)?;
    let engine = ScreenerEngine::new(provider, &config.valuation);

    let result = engine
        .evaluate_ticker(&ticker)
        .await
        .with_context(|| format!("No valuation for {}", ticker))?;

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

/// Download live fundamentals into `<dir>/<TICKER>.json`.
pub async fn fetch(
    config: Config,
    tickers: Vec<String>,
    input: Option<PathBuf>,
    dir: &Path,
) -> Result<()> {
    let tickers = collect_tickers(tickers, input.as_deref())?;
    let provider: Arc<dyn FundamentalsProvider> =
        Arc::new(YahooProvider::from_config(&config.provider)?);

    let mut saved = 0usize;
    for ticker in &tickers {
        match provider.fetch(ticker).await {
            Ok(record) => {
                let path = write_snapshot(dir, &record)
                    .await
                    .with_context(|| format!("Failed to write snapshot for {}", ticker))?;
                info!(ticker = %ticker, path = %path.display(), "Snapshot saved");
                saved += 1;
            }
            Err(e) => warn!(ticker = %ticker, kind = e.kind(), "Fetch failed: {}", e),
        }
    }

    println!(
        "Saved {} of {} snapshots to {}",
        saved,
        tickers.len(),
        dir.display()
    );
    Ok(())
}

/// Run the HTTP API until Ctrl-C.
pub async fn serve(mut config: Config, host: Option<String>, port: Option<u16>) -> Result<()> {
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    ScannerService::new(config)?.start().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    #[test]
    fn test_collect_tickers_merges_args_and_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "Ticker\nko\nmsft").unwrap();

        let tickers =
            collect_tickers(vec!["aapl".into(), "KO".into()], Some(file.path())).unwrap();
        assert_eq!(tickers, vec!["AAPL", "KO", "MSFT"]);
    }

    #[test]
    fn test_collect_tickers_requires_a_source() {
        assert!(collect_tickers(Vec::new(), None).is_err());
        assert!(collect_tickers(vec![" ".into()], None).unwrap().is_empty());
    }

    fn snapshot_scan(dir: &TempDir, tickers: Vec<String>, input: Option<PathBuf>) -> ScanOptions {
        ScanOptions {
            tickers,
            input,
            output: Some(dir.path().join("report")),
            snapshots: Some(dir.path().join("snapshots")),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_scan_header_only_csv_is_empty_batch() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("tickers.csv");
        std::fs::write(&input, "Ticker\n").unwrap();

        let options = snapshot_scan(&dir, Vec::new(), Some(input));
        assert!(scan(Config::default(), options).await.is_ok());
        assert!(!dir.path().join("report.csv").exists());
    }

    #[tokio::test]
    async fn test_scan_all_failures_exits_ok_without_report() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("snapshots")).unwrap();

        let options = snapshot_scan(&dir, vec!["ko".into(), "zzzz".into()], None);
        assert!(scan(Config::default(), options).await.is_ok());
        assert!(!dir.path().join("report.csv").exists());
    }

    #[test]
    fn test_use_snapshots_switches_provider() {
        let mut config = Config::default();
        use_snapshots(&mut config, Some(PathBuf::from("/tmp/snaps")));
        assert_eq!(config.provider.kind, ProviderKind::Snapshot);
        assert_eq!(config.provider.snapshot_dir.as_deref(), Some("/tmp/snaps"));
    }
}
