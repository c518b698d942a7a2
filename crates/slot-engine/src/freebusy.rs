//! Merged busy periods for fast candidate filtering.
//!
//! Sorts booked intervals by start time and merges overlapping or adjacent
//! ones, so a candidate slot can be tested with one binary search.

use chrono::{DateTime, Utc};

use crate::conflict::BookedInterval;

/// Sorted, non-overlapping busy periods.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BusyPeriods {
    periods: Vec<(DateTime<Utc>, DateTime<Utc>)>,
}

impl BusyPeriods {
    pub fn merge(booked: &[BookedInterval]) -> Self {
        let mut intervals: Vec<(DateTime<Utc>, DateTime<Utc>)> =
            booked.iter().map(|b| (b.start, b.end)).collect();
        intervals.sort_by_key(|&(start, end)| (start, end));

        let mut periods: Vec<(DateTime<Utc>, DateTime<Utc>)> = Vec::new();
        for (start, end) in intervals {
            if let Some(last) = periods.last_mut() {
                if start <= last.1 {
                    last.1 = last.1.max(end);
                    continue;
                }
            }
            periods.push((start, end));
        }

        Self { periods }
    }

    pub fn periods(&self) -> &[(DateTime<Utc>, DateTime<Utc>)] {
        &self.periods
    }

    /// True when `[start, end)` touches no busy period.
    pub fn is_free(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        // First period that ends after `start`; only it can overlap.
        let idx = self.periods.partition_point(|&(_, busy_end)| busy_end <= start);
        match self.periods.get(idx) {
            Some(&(busy_start, _)) => end <= busy_start,
            None => true,
        }
    }
}
