//! Integration tests for the bounded-concurrency batch orchestrator.

use chrono::NaiveDate;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use tempfile::TempDir;
use tickervault_core::batch::{sync_batch, BatchProgress, SilentProgress};
use tickervault_core::{Bar, CsvCache, DataError, DataProvider, FetchOutcome};

struct ScriptedProvider {
    data: HashMap<String, Vec<Bar>>,
    fail: HashMap<String, String>,
    available: bool,
    calls: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    fn new() -> Self {
        Self {
            data: HashMap::new(),
            fail: HashMap::new(),
            available: true,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn with_bars(mut self, symbol: &str, bars: Vec<Bar>) -> Self {
        self.data.insert(symbol.to_string(), bars);
        self
    }

    fn with_failure(mut self, symbol: &str, message: &str) -> Self {
        self.fail.insert(symbol.to_string(), message.to_string());
        self
    }

    fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }
}

impl DataProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Bar>, DataError> {
        self.calls.lock().unwrap().push(symbol.to_string());

        if let Some(msg) = self.fail.get(symbol) {
            return Err(DataError::Other(msg.clone()));
        }

        Ok(self
            .data
            .get(symbol)
            .map(|bars| {
                bars.iter()
                    .filter(|b| b.date >= start && b.date <= end)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn is_available(&self) -> bool {
        self.available
    }
}

/// Captures every progress callback for later assertions.
#[derive(Default)]
struct RecordingProgress {
    started: Mutex<Vec<String>>,
    completed_counts: Mutex<Vec<usize>>,
    batch_done: Mutex<Option<(usize, usize, usize, usize)>>,
}

impl BatchProgress for RecordingProgress {
    fn on_start(&self, symbol: &str) {
        self.started.lock().unwrap().push(symbol.to_string());
    }

    fn on_complete(&self, _symbol: &str, completed: usize, _total: usize, _out: &FetchOutcome) {
        self.completed_counts.lock().unwrap().push(completed);
    }

    fn on_batch_complete(&self, succeeded: usize, empty: usize, failed: usize, total: usize) {
        *self.batch_done.lock().unwrap() = Some((succeeded, empty, failed, total));
    }
}

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn daily_bars(from: NaiveDate, count: i64, base_price: f64) -> Vec<Bar> {
    (0..count)
        .map(|i| {
            let price = base_price + i as f64;
            Bar {
                date: from + chrono::Duration::days(i),
                open: price,
                high: price + 1.0,
                low: price - 1.0,
                close: price + 0.5,
                volume: 1000,
            }
        })
        .collect()
}

#[test]
fn one_entry_per_distinct_ticker() {
    let dir = TempDir::new().unwrap();
    let cache = CsvCache::new(dir.path());
    let provider = ScriptedProvider::new()
        .with_bars("SPY", daily_bars(d(2024, 1, 1), 5, 400.0))
        .with_bars("QQQ", daily_bars(d(2024, 1, 1), 5, 350.0))
        .with_bars("AAPL", daily_bars(d(2024, 1, 1), 5, 180.0));

    // SPY appears twice; it is one logical request
    let result = sync_batch(
        &provider,
        &cache,
        &["SPY", "QQQ", "SPY", "AAPL"],
        d(2024, 1, 1),
        d(2024, 1, 5),
        4,
        &SilentProgress,
    );

    assert_eq!(result.total(), 3);
    assert_eq!(result.succeeded, 3);
    assert_eq!(provider.calls.lock().unwrap().len(), 3);
    for sym in ["SPY", "QQQ", "AAPL"] {
        assert!(result.get(sym).unwrap().series().is_some());
    }
}

#[test]
fn one_failure_does_not_block_siblings() {
    let dir = TempDir::new().unwrap();
    let cache = CsvCache::new(dir.path());
    let provider = ScriptedProvider::new()
        .with_bars("SPY", daily_bars(d(2024, 1, 1), 5, 400.0))
        .with_bars("QQQ", daily_bars(d(2024, 1, 1), 5, 350.0))
        .with_failure("BAD", "provider exploded")
        .with_bars("AAPL", daily_bars(d(2024, 1, 1), 5, 180.0))
        .with_bars("MSFT", daily_bars(d(2024, 1, 1), 5, 370.0));

    let result = sync_batch(
        &provider,
        &cache,
        &["SPY", "QQQ", "BAD", "AAPL", "MSFT"],
        d(2024, 1, 1),
        d(2024, 1, 5),
        3,
        &SilentProgress,
    );

    assert_eq!(result.total(), 5);
    assert_eq!(result.succeeded, 4);
    assert_eq!(result.failed, 1);
    assert!(!result.all_succeeded());

    let errors: Vec<_> = result.errors().collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].0, "BAD");
    assert!(errors[0].1.contains("provider exploded"));

    // The siblings' caches were written despite the failure
    assert!(cache.read("SPY").unwrap().is_some());
    assert!(cache.read("MSFT").unwrap().is_some());
    assert!(cache.read("BAD").unwrap().is_none());
}

#[test]
fn empty_outcome_is_counted_separately() {
    let dir = TempDir::new().unwrap();
    let cache = CsvCache::new(dir.path());
    let provider = ScriptedProvider::new().with_bars("SPY", daily_bars(d(2024, 1, 1), 5, 400.0));

    let result = sync_batch(
        &provider,
        &cache,
        &["SPY", "UNKNOWN"],
        d(2024, 1, 1),
        d(2024, 1, 5),
        2,
        &SilentProgress,
    );

    assert_eq!(result.succeeded, 1);
    assert_eq!(result.empty, 1);
    assert_eq!(result.failed, 0);
    assert_eq!(result.get("UNKNOWN"), Some(&FetchOutcome::Empty));
}

#[test]
fn progress_counter_takes_each_value_exactly_once() {
    let dir = TempDir::new().unwrap();
    let cache = CsvCache::new(dir.path());
    let mut provider = ScriptedProvider::new();
    let symbols: Vec<String> = (0..16).map(|i| format!("SYM{i}")).collect();
    for sym in &symbols {
        provider = provider.with_bars(sym, daily_bars(d(2024, 1, 1), 5, 100.0));
    }
    let progress = RecordingProgress::default();
    let symbol_refs: Vec<&str> = symbols.iter().map(String::as_str).collect();

    let result = sync_batch(
        &provider,
        &cache,
        &symbol_refs,
        d(2024, 1, 1),
        d(2024, 1, 5),
        8,
        &progress,
    );

    assert_eq!(result.total(), 16);
    let counts = progress.completed_counts.lock().unwrap().clone();
    let distinct: HashSet<usize> = counts.iter().copied().collect();
    assert_eq!(counts.len(), 16);
    assert_eq!(distinct, (1..=16).collect::<HashSet<usize>>());
    assert_eq!(progress.started.lock().unwrap().len(), 16);
    assert_eq!(
        *progress.batch_done.lock().unwrap(),
        Some((16, 0, 0, 16))
    );
}

#[test]
fn single_worker_progress_is_strictly_increasing() {
    let dir = TempDir::new().unwrap();
    let cache = CsvCache::new(dir.path());
    let provider = ScriptedProvider::new()
        .with_bars("SPY", daily_bars(d(2024, 1, 1), 5, 400.0))
        .with_bars("QQQ", daily_bars(d(2024, 1, 1), 5, 350.0))
        .with_bars("AAPL", daily_bars(d(2024, 1, 1), 5, 180.0));
    let progress = RecordingProgress::default();

    sync_batch(
        &provider,
        &cache,
        &["SPY", "QQQ", "AAPL"],
        d(2024, 1, 1),
        d(2024, 1, 5),
        1,
        &progress,
    );

    assert_eq!(*progress.completed_counts.lock().unwrap(), vec![1, 2, 3]);
}

#[test]
fn empty_symbol_list_completes_immediately() {
    let dir = TempDir::new().unwrap();
    let cache = CsvCache::new(dir.path());
    let provider = ScriptedProvider::new();
    let progress = RecordingProgress::default();

    let result = sync_batch(
        &provider,
        &cache,
        &[],
        d(2024, 1, 1),
        d(2024, 1, 5),
        8,
        &progress,
    );

    assert_eq!(result.total(), 0);
    assert!(result.all_succeeded());
    assert_eq!(*progress.batch_done.lock().unwrap(), Some((0, 0, 0, 0)));
}

#[test]
fn unavailable_provider_fails_every_ticker_without_fetching() {
    let dir = TempDir::new().unwrap();
    let cache = CsvCache::new(dir.path());
    let provider = ScriptedProvider::new()
        .with_bars("SPY", daily_bars(d(2024, 1, 1), 5, 400.0))
        .unavailable();

    let result = sync_batch(
        &provider,
        &cache,
        &["SPY", "QQQ"],
        d(2024, 1, 1),
        d(2024, 1, 5),
        2,
        &SilentProgress,
    );

    assert_eq!(result.total(), 2);
    assert_eq!(result.failed, 2);
    assert!(provider.calls.lock().unwrap().is_empty());
    for (_, msg) in result.errors() {
        assert!(msg.contains("circuit breaker"));
    }
}

#[test]
fn zero_workers_is_clamped_to_one() {
    let dir = TempDir::new().unwrap();
    let cache = CsvCache::new(dir.path());
    let provider = ScriptedProvider::new().with_bars("SPY", daily_bars(d(2024, 1, 1), 5, 400.0));

    let result = sync_batch(
        &provider,
        &cache,
        &["SPY"],
        d(2024, 1, 1),
        d(2024, 1, 5),
        0,
        &SilentProgress,
    );

    assert_eq!(result.succeeded, 1);
}
