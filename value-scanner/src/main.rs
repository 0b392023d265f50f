//! Value Scanner CLI entry point.

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use value_common::config::Config;
use value_common::logging::init_from_config;
use value_scanner::screener::ReportFormat;

mod commands;

/// Margin-of-safety value screener.
#[derive(Parser, Debug)]
#[command(name = "value-scanner")]
#[command(version)]
#[command(about = "Screen equities for undervalued opportunities", long_about = None)]
struct Cli {
    /// Configuration file (default: ~/.valuescan/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Evaluate a batch of tickers and write a report
    Scan {
        /// Tickers to evaluate (combined with --input)
        tickers: Vec<String>,

        /// CSV file with a Ticker column
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Report path (default: report.output_path)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Report format: csv, markdown, json (default: report.format)
        #[arg(short, long)]
        format: Option<ReportFormat>,

        /// Keep input order instead of sorting by discount
        #[arg(long)]
        unsorted: bool,

        /// Only keep undervalued tickers
        #[arg(long)]
        undervalued_only: bool,

        /// Read fundamentals from a snapshot directory instead of the network
        #[arg(long)]
        snapshots: Option<PathBuf>,
    },

    /// Evaluate one ticker and print the result as JSON
    Evaluate {
        ticker: String,

        /// Read fundamentals from a snapshot directory instead of the network
        #[arg(long)]
        snapshots: Option<PathBuf>,
    },

    /// Download fundamentals into a snapshot directory
    Fetch {
        /// Tickers to download (combined with --input)
        tickers: Vec<String>,

        /// CSV file with a Ticker column
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Snapshot directory
        #[arg(long)]
        dir: PathBuf,
    },

    /// Start the HTTP API
    Serve {
        /// Host to bind to (default: server.host)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (default: server.port)
        #[arg(long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load_and_validate(cli.config.as_deref())?;
    init_from_config(&config.observability);

    tracing::debug!("Value Scanner v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Scan {
            tickers,
            input,
            output,
            format,
            unsorted,
            undervalued_only,
            snapshots,
        } => {
            let options = commands::ScanOptions {
                tickers,
                input,
                output,
                format,
                unsorted,
                undervalued_only,
                snapshots,
            };
            commands::scan(config, options).await
        }
        Commands::Evaluate { ticker, snapshots } => {
            commands::evaluate(config, &ticker, snapshots).await
        }
        Commands::Fetch { tickers, input, dir } => {
            commands::fetch(config, tickers, input, &dir).await
        }
        Commands::Serve { host, port } => commands::serve(config, host, port).await,
    }
}
