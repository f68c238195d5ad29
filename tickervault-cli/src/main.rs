//! TickerVault CLI — batch download and cache inspection.
//!
//! Commands:
//! - `download` — bring cached CSVs up to date for a set of tickers,
//!   fetching only the missing date ranges
//! - `cache status` — report cached row counts and date ranges

use anyhow::{anyhow, bail, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tickervault_core::{
    sync_batch, CircuitBreaker, CsvCache, StdoutProgress, SyncConfig, YahooProvider,
};

#[derive(Parser)]
#[command(
    name = "tickervault",
    about = "TickerVault — incremental OHLCV downloader with a per-ticker CSV cache"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download daily OHLCV data and merge it into the CSV cache.
    Download {
        /// Tickers to download (e.g., SPY QQQ AAPL).
        #[arg(required = true)]
        symbols: Vec<String>,

        /// Start date (YYYY-MM-DD). Defaults to 10 years ago.
        #[arg(long)]
        start: Option<String>,

        /// End date (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        end: Option<String>,

        /// Concurrent fetch workers. Overrides the config value.
        #[arg(long)]
        jobs: Option<usize>,

        /// Cache directory. Overrides the config value (default ./data).
        #[arg(long)]
        cache_dir: Option<PathBuf>,

        /// Optional TOML config file with workers/cache_dir settings.
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Cache management commands.
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// Report cached row counts and date ranges.
    Status {
        /// Tickers to inspect. Defaults to every cached ticker.
        symbols: Vec<String>,

        /// Cache directory. Overrides the config value (default ./data).
        #[arg(long)]
        cache_dir: Option<PathBuf>,

        /// Optional TOML config file with workers/cache_dir settings.
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Download {
            symbols,
            start,
            end,
            jobs,
            cache_dir,
            config,
        } => run_download(symbols, start, end, jobs, cache_dir, config),
        Commands::Cache {
            action:
                CacheAction::Status {
                    symbols,
                    cache_dir,
                    config,
                },
        } => run_cache_status(symbols, cache_dir, config),
    }
}

fn load_config(
    path: Option<PathBuf>,
    cache_dir: Option<PathBuf>,
    jobs: Option<usize>,
) -> Result<SyncConfig> {
    let mut config = match path {
        Some(p) => SyncConfig::from_file(&p).map_err(|e| anyhow!(e))?,
        None => SyncConfig::default(),
    };
    if let Some(dir) = cache_dir {
        config.cache_dir = dir;
    }
    if let Some(jobs) = jobs {
        config.workers = jobs;
    }
    Ok(config)
}

fn run_download(
    symbols: Vec<String>,
    start: Option<String>,
    end: Option<String>,
    jobs: Option<usize>,
    cache_dir: Option<PathBuf>,
    config: Option<PathBuf>,
) -> Result<()> {
    let config = load_config(config, cache_dir, jobs)?;

    let start_date = start
        .as_deref()
        .map(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
        .transpose()?
        .unwrap_or_else(|| chrono::Local::now().date_naive() - chrono::Duration::days(365 * 10));

    let end_date = end
        .as_deref()
        .map(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
        .transpose()?
        .unwrap_or_else(|| chrono::Local::now().date_naive());

    if start_date > end_date {
        bail!("start date {start_date} is after end date {end_date}");
    }

    let circuit_breaker = Arc::new(CircuitBreaker::default_provider());
    let provider = YahooProvider::new(circuit_breaker);
    let cache = CsvCache::new(&config.cache_dir);

    let sym_refs: Vec<&str> = symbols.iter().map(|s| s.as_str()).collect();
    let result = sync_batch(
        &provider,
        &cache,
        &sym_refs,
        start_date,
        end_date,
        config.workers,
        &StdoutProgress,
    );

    // Per-ticker failures are warnings; the batch itself succeeded
    for (symbol, message) in result.errors() {
        eprintln!("warning: {symbol}: {message}");
    }

    Ok(())
}

fn run_cache_status(
    symbols: Vec<String>,
    cache_dir: Option<PathBuf>,
    config: Option<PathBuf>,
) -> Result<()> {
    let config = load_config(config, cache_dir, None)?;
    let cache = CsvCache::new(&config.cache_dir);

    let symbols = if symbols.is_empty() {
        cache.cached_symbols().map_err(|e| anyhow!(e.to_string()))?
    } else {
        symbols
    };

    if symbols.is_empty() {
        println!("Cache is empty: {}", config.cache_dir.display());
        return Ok(());
    }

    let sym_refs: Vec<&str> = symbols.iter().map(|s| s.as_str()).collect();
    for status in cache.status(&sym_refs) {
        match (status.rows, status.first_date, status.last_date) {
            (Some(rows), Some(first), Some(last)) => {
                println!("{}: {rows} rows, {first} .. {last}", status.symbol);
            }
            _ => println!("{}: not cached", status.symbol),
        }
    }

    Ok(())
}
