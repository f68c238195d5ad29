//! TickerVault Core — incremental fetch-and-merge pipeline for daily
//! OHLCV series.
//!
//! The library brings a local CSV cache of per-ticker price history up to
//! date with the minimum amount of network traffic:
//! - Provider seam and structured errors (`provider`)
//! - Date-ordered series model with dedup merge (`series`)
//! - One-CSV-per-ticker cache store with quarantine (`cache`)
//! - Watermark-based incremental fetch for one ticker (`sync`)
//! - Bounded-concurrency batch orchestrator with progress (`batch`)
//! - Yahoo Finance provider with retry and circuit breaker (`yahoo`)

pub mod batch;
pub mod cache;
pub mod circuit_breaker;
pub mod config;
pub mod provider;
pub mod series;
pub mod sync;
pub mod yahoo;

pub use batch::{sync_batch, BatchProgress, BatchResult, SilentProgress, StdoutProgress,
    DEFAULT_WORKERS};
pub use cache::{CacheStatus, CsvCache};
pub use circuit_breaker::CircuitBreaker;
pub use config::SyncConfig;
pub use provider::{Bar, DataError, DataProvider};
pub use series::Series;
pub use sync::{sync_symbol, FetchOutcome};
pub use yahoo::YahooProvider;
