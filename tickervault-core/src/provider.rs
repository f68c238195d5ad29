//! Data provider trait and structured error types.
//!
//! `DataProvider` is the seam between the fetch-and-merge pipeline and
//! whatever supplies the actual bars (Yahoo Finance in production, a
//! scripted provider in tests). Providers know nothing about the cache;
//! the sync layer sits above both.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One daily OHLCV record.
///
/// The field order matches the on-disk CSV column order
/// (`date,open,high,low,close,volume`), so cached files written by earlier
/// versions of the tool round-trip unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

/// Structured error types for fetch and cache operations.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("hard stop: data provider has blocked requests (circuit breaker tripped)")]
    CircuitBreakerTripped,

    #[error("invalid date range: start {start} is after end {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("cache error: {0}")]
    CacheError(String),

    #[error("data error: {0}")]
    Other(String),
}

/// Trait for daily-bar data sources.
pub trait DataProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch daily bars for `symbol` over `[start, end]`, both inclusive
    /// calendar days.
    ///
    /// An empty Vec is a valid answer: the provider had no rows for the
    /// range (delisted symbol, range entirely on non-trading days). It is
    /// not an error.
    fn fetch(&self, symbol: &str, start: NaiveDate, end: NaiveDate)
        -> Result<Vec<Bar>, DataError>;

    /// Whether the provider will currently accept requests (not banned,
    /// not in a rate-limit cooldown).
    fn is_available(&self) -> bool {
        true
    }
}
