//! Incremental fetch-and-merge for a single ticker.
//!
//! Resolves the smallest provider request that brings the cached series up
//! to the requested end date: no call at all when the watermark already
//! covers it, a tail-only call past the watermark, or a full-range call on
//! a cold cache. Both ends of the range are inclusive calendar days.

use crate::cache::CsvCache;
use crate::provider::{DataError, DataProvider};
use crate::series::Series;
use chrono::{Duration, NaiveDate};

/// Outcome of one ticker's fetch-and-merge.
///
/// Carries data or an error message, never both. Errors are plain strings
/// because they cross the batch boundary as warnings, not as values the
/// caller branches on.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// The series now cached for the ticker — freshly fetched, merged, or
    /// already current.
    Series(Series),
    /// The provider had no rows for the range and nothing was cached.
    Empty,
    /// The fetch failed. Sibling tickers in a batch are unaffected.
    Error(String),
}

impl FetchOutcome {
    pub fn is_error(&self) -> bool {
        matches!(self, FetchOutcome::Error(_))
    }

    pub fn series(&self) -> Option<&Series> {
        match self {
            FetchOutcome::Series(s) => Some(s),
            _ => None,
        }
    }
}

/// Bring the cached series for `symbol` up to `end`, fetching only the
/// missing date range.
///
/// Behavior per cache state:
/// - no entry: fetch `[start, end]`; empty response leaves no cache file
/// - watermark >= `end`: return the cached series, zero network calls
/// - watermark < `end`: fetch `[watermark + 1 day, end]` and merge, with
///   fetched rows winning on overlapping dates
///
/// Every provider or cache failure is converted into
/// [`FetchOutcome::Error`]; this function never propagates one.
pub fn sync_symbol(
    provider: &dyn DataProvider,
    cache: &CsvCache,
    symbol: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> FetchOutcome {
    if symbol.is_empty() {
        return FetchOutcome::Error("empty ticker symbol".into());
    }
    if start > end {
        return FetchOutcome::Error(DataError::InvalidRange { start, end }.to_string());
    }

    let cached = match cache.read(symbol) {
        Ok(cached) => cached,
        Err(e) => return FetchOutcome::Error(e.to_string()),
    };

    match cached {
        None => fetch_full(provider, cache, symbol, start, end),
        Some(cached) => fetch_tail(provider, cache, symbol, cached, end),
    }
}

/// Cold cache: one request for the whole range.
fn fetch_full(
    provider: &dyn DataProvider,
    cache: &CsvCache,
    symbol: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> FetchOutcome {
    match provider.fetch(symbol, start, end) {
        Err(e) => FetchOutcome::Error(e.to_string()),
        Ok(bars) if bars.is_empty() => FetchOutcome::Empty,
        Ok(bars) => {
            let series = Series::new(bars);
            match cache.write(symbol, &series) {
                Ok(()) => FetchOutcome::Series(series),
                Err(e) => FetchOutcome::Error(e.to_string()),
            }
        }
    }
}

/// Warm cache: request only the days past the watermark, if any.
fn fetch_tail(
    provider: &dyn DataProvider,
    cache: &CsvCache,
    symbol: &str,
    cached: Series,
    end: NaiveDate,
) -> FetchOutcome {
    // CsvCache::read never yields a zero-row series
    let Some(watermark) = cached.last_date() else {
        return FetchOutcome::Error(format!("cached series for {symbol} has no rows"));
    };

    if watermark >= end {
        return FetchOutcome::Series(cached);
    }

    let tail_start = watermark + Duration::days(1);
    match provider.fetch(symbol, tail_start, end) {
        Err(e) => FetchOutcome::Error(e.to_string()),
        Ok(bars) if bars.is_empty() => FetchOutcome::Series(cached),
        Ok(bars) => {
            let merged = cached.merge(bars);
            match cache.write(symbol, &merged) {
                Ok(()) => FetchOutcome::Series(merged),
                Err(e) => FetchOutcome::Error(e.to_string()),
            }
        }
    }
}
