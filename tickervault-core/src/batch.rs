//! Batch orchestrator — fans [`sync_symbol`] out over a bounded worker
//! pool and aggregates per-ticker outcomes.
//!
//! One ticker's failure never cancels or delays the rest; the call returns
//! only after every ticker has an outcome. Each ticker is owned by exactly
//! one worker, so the result map has no concurrent writers per key.

use crate::cache::CsvCache;
use crate::provider::{DataError, DataProvider};
use crate::sync::{sync_symbol, FetchOutcome};
use chrono::NaiveDate;
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Default number of concurrent fetches per batch.
pub const DEFAULT_WORKERS: usize = 8;

/// Progress callbacks for a batch. Invoked from worker threads.
pub trait BatchProgress: Send + Sync {
    /// Called when a worker picks up a ticker.
    fn on_start(&self, symbol: &str);

    /// Called when a ticker finishes. `completed` counts finished tickers
    /// and takes each value in `1..=total` exactly once across the batch.
    fn on_complete(&self, symbol: &str, completed: usize, total: usize, outcome: &FetchOutcome);

    /// Called once, after every ticker has an outcome.
    fn on_batch_complete(&self, succeeded: usize, empty: usize, failed: usize, total: usize);
}

/// Progress reporter that prints to stdout.
pub struct StdoutProgress;

impl BatchProgress for StdoutProgress {
    fn on_start(&self, symbol: &str) {
        println!("Fetching {symbol}...");
    }

    fn on_complete(&self, symbol: &str, completed: usize, total: usize, outcome: &FetchOutcome) {
        match outcome {
            FetchOutcome::Series(s) => {
                println!("[{completed}/{total}] {symbol}: {} rows", s.len())
            }
            FetchOutcome::Empty => println!("[{completed}/{total}] {symbol}: no data"),
            FetchOutcome::Error(msg) => println!("[{completed}/{total}] {symbol}: FAIL: {msg}"),
        }
    }

    fn on_batch_complete(&self, succeeded: usize, empty: usize, failed: usize, total: usize) {
        println!("\nBatch complete: {succeeded}/{total} succeeded, {empty} empty, {failed} failed");
    }
}

/// No-op reporter for hosts that inspect the [`BatchResult`] instead.
pub struct SilentProgress;

impl BatchProgress for SilentProgress {
    fn on_start(&self, _symbol: &str) {}
    fn on_complete(&self, _symbol: &str, _completed: usize, _total: usize, _out: &FetchOutcome) {}
    fn on_batch_complete(&self, _succeeded: usize, _empty: usize, _failed: usize, _total: usize) {}
}

/// Aggregated outcome of one batch call: exactly one entry per distinct
/// input ticker, plus tallies by outcome kind.
#[derive(Debug)]
pub struct BatchResult {
    outcomes: HashMap<String, FetchOutcome>,
    pub succeeded: usize,
    pub empty: usize,
    pub failed: usize,
}

impl BatchResult {
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn get(&self, symbol: &str) -> Option<&FetchOutcome> {
        self.outcomes.get(symbol)
    }

    pub fn outcomes(&self) -> &HashMap<String, FetchOutcome> {
        &self.outcomes
    }

    pub fn into_outcomes(self) -> HashMap<String, FetchOutcome> {
        self.outcomes
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }

    /// Per-ticker error messages, for surfacing as warnings.
    pub fn errors(&self) -> impl Iterator<Item = (&str, &str)> {
        self.outcomes.iter().filter_map(|(sym, out)| match out {
            FetchOutcome::Error(msg) => Some((sym.as_str(), msg.as_str())),
            _ => None,
        })
    }
}

/// Run [`sync_symbol`] for every distinct ticker under a pool of `workers`
/// threads.
///
/// Duplicate symbols collapse into a single logical request. The pool is
/// built for this call and torn down when it returns. Completion order is
/// unspecified; the result always holds one outcome per distinct ticker.
pub fn sync_batch(
    provider: &dyn DataProvider,
    cache: &CsvCache,
    symbols: &[&str],
    start: NaiveDate,
    end: NaiveDate,
    workers: usize,
    progress: &dyn BatchProgress,
) -> BatchResult {
    let mut seen = HashSet::new();
    let unique: Vec<&str> = symbols.iter().copied().filter(|s| seen.insert(*s)).collect();
    let total = unique.len();

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers.max(1))
        .build()
        .expect("failed to build worker pool");

    let completed = AtomicUsize::new(0);

    let collected: Vec<(String, FetchOutcome)> = pool.install(|| {
        unique
            .par_iter()
            .map(|symbol| {
                progress.on_start(symbol);

                // A tripped breaker fails the ticker fast instead of
                // hammering the provider; it still gets its result slot.
                let outcome = if provider.is_available() {
                    sync_symbol(provider, cache, symbol, start, end)
                } else {
                    FetchOutcome::Error(DataError::CircuitBreakerTripped.to_string())
                };

                let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                progress.on_complete(symbol, done, total, &outcome);

                (symbol.to_string(), outcome)
            })
            .collect()
    });

    let mut outcomes = HashMap::with_capacity(total);
    let (mut succeeded, mut empty, mut failed) = (0, 0, 0);
    for (symbol, outcome) in collected {
        match &outcome {
            FetchOutcome::Series(_) => succeeded += 1,
            FetchOutcome::Empty => empty += 1,
            FetchOutcome::Error(_) => failed += 1,
        }
        outcomes.insert(symbol, outcome);
    }

    progress.on_batch_complete(succeeded, empty, failed, total);

    BatchResult {
        outcomes,
        succeeded,
        empty,
        failed,
    }
}
