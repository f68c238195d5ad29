//! Date-ordered OHLCV series for a single ticker.

use crate::provider::Bar;
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// An ordered, date-indexed sequence of daily bars for one ticker.
///
/// Invariant: dates strictly increasing, no duplicates. Both construction
/// and merging enforce it, so holders of a `Series` never re-sort.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    bars: Vec<Bar>,
}

impl Series {
    /// Build a series from bars in any order.
    ///
    /// Duplicate dates collapse to a single row; the later bar in the
    /// input wins.
    pub fn new(bars: Vec<Bar>) -> Self {
        let mut by_date: BTreeMap<NaiveDate, Bar> = BTreeMap::new();
        for bar in bars {
            by_date.insert(bar.date, bar);
        }
        Self {
            bars: by_date.into_values().collect(),
        }
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn into_bars(self) -> Vec<Bar> {
        self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.bars.first().map(|b| b.date)
    }

    /// The watermark: most recent date present in the series.
    pub fn last_date(&self) -> Option<NaiveDate> {
        self.bars.last().map(|b| b.date)
    }

    /// Deduplicated, date-sorted union of this series and `newer`.
    ///
    /// On overlapping dates the row from `newer` wins, so a re-fetch of an
    /// already-cached day replaces the stale row.
    pub fn merge(&self, newer: Vec<Bar>) -> Series {
        let mut by_date: BTreeMap<NaiveDate, Bar> =
            self.bars.iter().map(|b| (b.date, b.clone())).collect();
        for bar in newer {
            by_date.insert(bar.date, bar);
        }
        Series {
            bars: by_date.into_values().collect(),
        }
    }
}
