//! CSV cache store — one delimited file per ticker.
//!
//! Layout: `{cache_dir}/{SYMBOL}.csv` with a header row and one row per
//! trading day (`date,open,high,low,close,volume`). The first column is
//! the date key the sync layer uses to compute the watermark.
//!
//! Features:
//! - Atomic writes (write to .tmp, rename into place)
//! - Quarantine for unreadable files ({SYMBOL}.csv.quarantined); a
//!   quarantined ticker reads as absent, which forces a full refetch

use crate::provider::{Bar, DataError};
use crate::series::Series;
use chrono::NaiveDate;
use std::fs;
use std::path::{Path, PathBuf};

/// The CSV cache. Cheap to construct; holds only the root directory.
pub struct CsvCache {
    cache_dir: PathBuf,
}

impl CsvCache {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
        }
    }

    /// Root directory of the cache.
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Path to the CSV file for a symbol: `{cache_dir}/{SYMBOL}.csv`
    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.cache_dir.join(format!("{symbol}.csv"))
    }

    /// Read the cached series for a symbol.
    ///
    /// A missing file reads as `Ok(None)`. A file that exists but cannot
    /// be parsed is quarantined and also reads as `Ok(None)` — the
    /// corruption policy is "treat as absent", so the ticker is refetched
    /// in full rather than failed.
    pub fn read(&self, symbol: &str) -> Result<Option<Series>, DataError> {
        let path = self.csv_path(symbol);
        if !path.exists() {
            return Ok(None);
        }

        let mut reader = match csv::Reader::from_path(&path) {
            Ok(r) => r,
            Err(e) => {
                self.quarantine(&path, &e.to_string());
                return Ok(None);
            }
        };

        let mut bars: Vec<Bar> = Vec::new();
        for row in reader.deserialize::<Bar>() {
            match row {
                Ok(bar) => bars.push(bar),
                Err(e) => {
                    self.quarantine(&path, &e.to_string());
                    return Ok(None);
                }
            }
        }

        if bars.is_empty() {
            // Header-only file; nothing usable
            self.quarantine(&path, "no data rows");
            return Ok(None);
        }

        Ok(Some(Series::new(bars)))
    }

    /// Persist a series for a symbol, replacing any previous file.
    ///
    /// Writes to a `.tmp` sibling and renames into place so a crash
    /// mid-write never leaves a truncated cache file behind.
    pub fn write(&self, symbol: &str, series: &Series) -> Result<(), DataError> {
        if series.is_empty() {
            return Err(DataError::CacheError(format!(
                "refusing to cache an empty series for {symbol}"
            )));
        }

        fs::create_dir_all(&self.cache_dir)
            .map_err(|e| DataError::CacheError(format!("failed to create cache dir: {e}")))?;

        let path = self.csv_path(symbol);
        let tmp_path = path.with_extension("csv.tmp");

        let mut writer = csv::Writer::from_path(&tmp_path)
            .map_err(|e| DataError::CacheError(format!("create {}: {e}", tmp_path.display())))?;
        for bar in series.bars() {
            writer
                .serialize(bar)
                .map_err(|e| DataError::CacheError(format!("serialize row: {e}")))?;
        }
        writer
            .flush()
            .map_err(|e| DataError::CacheError(format!("flush: {e}")))?;
        drop(writer);

        fs::rename(&tmp_path, &path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            DataError::CacheError(format!("atomic rename failed: {e}"))
        })?;

        Ok(())
    }

    /// Move an unreadable file aside so the next read starts clean.
    fn quarantine(&self, path: &Path, reason: &str) {
        let quarantined = path.with_extension("csv.quarantined");
        eprintln!(
            "WARNING: quarantining unreadable cache file {}: {reason}",
            path.display()
        );
        let _ = fs::rename(path, &quarantined);
    }

    /// Symbols that currently have a cache file, sorted.
    pub fn cached_symbols(&self) -> Result<Vec<String>, DataError> {
        if !self.cache_dir.exists() {
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(&self.cache_dir)
            .map_err(|e| DataError::CacheError(format!("read cache dir: {e}")))?;

        let mut symbols = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| DataError::CacheError(format!("dir entry: {e}")))?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("csv") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                symbols.push(stem.to_string());
            }
        }

        symbols.sort();
        Ok(symbols)
    }

    /// Cached row counts and date ranges for the given symbols.
    pub fn status(&self, symbols: &[&str]) -> Vec<CacheStatus> {
        symbols
            .iter()
            .map(|sym| {
                let series = self.read(sym).ok().flatten();
                CacheStatus {
                    symbol: sym.to_string(),
                    cached: series.is_some(),
                    first_date: series.as_ref().and_then(|s| s.first_date()),
                    last_date: series.as_ref().and_then(|s| s.last_date()),
                    rows: series.as_ref().map(|s| s.len()),
                }
            })
            .collect()
    }
}

/// Cache status for a single symbol.
#[derive(Debug, Clone)]
pub struct CacheStatus {
    pub symbol: String,
    pub cached: bool,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub rows: Option<usize>,
}
