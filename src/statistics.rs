//! Descriptive statistics over observed-value series.
//!
//! Every statistic here is a pure function of the slice it is given. Ledgers
//! keep the full history of each series and recompute from it, so a derived
//! value can never drift away from the data it summarises.
//!
//! # Usage
//!
//! ```
//! use tick_ledger::statistics::{mean, median, SeriesStats};
//!
//! let intervals = [10.0, 15.0];
//! assert_eq!(mean(&intervals), 12.5);
//! assert_eq!(median(&intervals), 12.5);
//!
//! let stats = SeriesStats::from_values(&intervals);
//! assert_eq!(stats.max, 15.0);
//! ```
//!
//! All functions return `0.0` for an empty series.

use serde::{Deserialize, Serialize};

/// Arithmetic mean, `0.0` when empty.
#[inline]
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Order-statistic median of a copy of `values`, `0.0` when empty.
///
/// Even length averages the two middle elements.
pub fn median(values: &[f64]) -> f64 {
    let sorted = sorted_copy(values);
    median_of_sorted(&sorted)
}

/// Largest element, `0.0` when empty.
pub fn max(values: &[f64]) -> f64 {
    values
        .iter()
        .copied()
        .max_by(f64::total_cmp)
        .unwrap_or(0.0)
}

/// Median of an already sorted slice.
#[inline]
pub fn median_of_sorted(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return 0.0;
    }
    if n % 2 == 0 {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    } else {
        sorted[n / 2]
    }
}

fn sorted_copy(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted
}

/// Mean, median and maximum of one series, computed together.
///
/// Sorts a single copy of the input and reads the median and maximum from it,
/// which is the same result as calling [`mean`], [`median`] and [`max`]
/// separately.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SeriesStats {
    /// Number of observations
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub max: f64,
}

impl SeriesStats {
    /// Compute from a series of reals.
    pub fn from_values(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }

        let sorted = sorted_copy(values);
        Self {
            count: sorted.len(),
            mean: mean(values),
            median: median_of_sorted(&sorted),
            max: sorted[sorted.len() - 1],
        }
    }

    /// Compute from a series of whole-second durations.
    pub fn from_seconds(values: &[i64]) -> Self {
        let as_f64: Vec<f64> = values.iter().map(|&v| v as f64).collect();
        Self::from_values(&as_f64)
    }

    /// Check if the series was empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}
