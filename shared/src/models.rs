use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A dated indicator series. `values[i]` belongs to `dates[i]`; `None` marks a
/// date where the indicator is not defined yet (e.g. not enough history).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series<T> {
    pub dates: Vec<NaiveDate>,
    pub values: Vec<Option<T>>,
}

impl<T: Copy> Series<T> {
    pub fn new(dates: Vec<NaiveDate>, values: Vec<Option<T>>) -> Self {
        debug_assert_eq!(dates.len(), values.len());
        Self { dates, values }
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Last row of the series, which is also the most recent trading date.
    pub fn latest(&self) -> Option<(NaiveDate, Option<T>)> {
        self.dates.last().copied().zip(self.values.last().copied())
    }

    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, Option<T>)> + '_ {
        self.dates.iter().copied().zip(self.values.iter().copied())
    }
}

/// Percentage of constituents above their moving average, 0-100.
pub type PercentSeries = Series<f64>;

/// Signed integer counts (high/low net, advance-decline line).
pub type CountSeries = Series<i64>;

/// Latest values of every persisted series. This is what the narrative step
/// gets to see; it never touches the full history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreadthSnapshot {
    pub market: String,
    pub as_of: NaiveDate,
    /// Keyed by MA window length in trading days.
    pub percent_above_ma: BTreeMap<usize, Option<f64>>,
    pub high_low_net: i64,
    pub advance_decline: i64,
}
