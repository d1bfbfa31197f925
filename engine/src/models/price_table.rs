// Aligned closing-price table: one row per trading date, one column per ticker.
use std::collections::{BTreeMap, BTreeSet, HashSet};

use chrono::NaiveDate;

use crate::error::{BreadthError, Result};

/// Closing prices keyed by date and ticker.
///
/// Cells are `Option<f64>`: a ticker that did not trade (or was not listed yet)
/// on a date holds `None`. Aggregations skip `None` cells; they are never read
/// as zero.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceTable {
    dates: Vec<NaiveDate>,
    tickers: Vec<String>,
    columns: Vec<Vec<Option<f64>>>,
}

impl PriceTable {
    /// Builds a table from explicit rows and columns. Only the shape is checked
    /// here; ordering and value checks happen in [`PriceTable::validate`].
    pub fn new(dates: Vec<NaiveDate>, columns: Vec<(String, Vec<Option<f64>>)>) -> Result<Self> {
        let mut seen = HashSet::new();
        let mut tickers = Vec::with_capacity(columns.len());
        let mut values = Vec::with_capacity(columns.len());

        for (ticker, column) in columns {
            if column.len() != dates.len() {
                return Err(BreadthError::InvalidInput(format!(
                    "column '{}' has {} rows but the table has {} dates",
                    ticker,
                    column.len(),
                    dates.len()
                )));
            }
            if !seen.insert(ticker.clone()) {
                return Err(BreadthError::InvalidInput(format!("duplicate ticker column '{}'", ticker)));
            }
            tickers.push(ticker);
            values.push(column);
        }

        Ok(Self { dates, tickers, columns: values })
    }

    /// Aligns per-ticker series on the union of their dates. Tickers keep the
    /// order of the map; empty series are dropped so no column is all-missing.
    pub fn from_ticker_series(series: BTreeMap<String, BTreeMap<NaiveDate, f64>>) -> Self {
        let dates: Vec<NaiveDate> = series
            .values()
            .flat_map(|closes| closes.keys().copied())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let mut tickers = Vec::with_capacity(series.len());
        let mut columns = Vec::with_capacity(series.len());
        for (ticker, closes) in series {
            if closes.is_empty() {
                continue;
            }
            columns.push(dates.iter().map(|d| closes.get(d).copied()).collect());
            tickers.push(ticker);
        }

        Self { dates, tickers, columns }
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn tickers(&self) -> &[String] {
        &self.tickers
    }

    pub fn columns(&self) -> &[Vec<Option<f64>>] {
        &self.columns
    }

    pub fn column(&self, ticker: &str) -> Option<&[Option<f64>]> {
        self.tickers
            .iter()
            .position(|t| t == ticker)
            .map(|idx| self.columns[idx].as_slice())
    }

    pub fn ticker_count(&self) -> usize {
        self.tickers.len()
    }

    /// Number of date rows.
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    /// Tickers with a price on row `idx`.
    pub fn present_on(&self, idx: usize) -> usize {
        self.columns.iter().filter(|c| c[idx].is_some()).count()
    }

    /// Checks the invariants every calculator relies on: at least one ticker,
    /// strictly ascending dates and finite positive prices.
    pub fn validate(&self) -> Result<()> {
        if self.tickers.is_empty() {
            return Err(BreadthError::InvalidInput("price table has zero ticker columns".to_string()));
        }

        for pair in self.dates.windows(2) {
            if pair[0] == pair[1] {
                return Err(BreadthError::InvalidInput(format!("duplicate date row {}", pair[1])));
            }
            if pair[0] > pair[1] {
                return Err(BreadthError::InvalidInput(format!(
                    "dates are not ascending: {} follows {}",
                    pair[1], pair[0]
                )));
            }
        }

        for (ticker, column) in self.tickers.iter().zip(&self.columns) {
            for (date, cell) in self.dates.iter().zip(column) {
                if let Some(price) = cell {
                    if !price.is_finite() || *price <= 0.0 {
                        return Err(BreadthError::InvalidInput(format!(
                            "non-positive or non-numeric price {} for '{}' on {}",
                            price, ticker, date
                        )));
                    }
                }
            }
        }

        Ok(())
    }
}
