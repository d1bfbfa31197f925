// Collects per-ticker closes from a price source and aligns them into a PriceTable
use std::collections::BTreeMap;

use chrono::NaiveDate;

use super::price_source::PriceSource;
use crate::models::PriceTable;

pub struct PriceTableBuilder<'a> {
    source: &'a dyn PriceSource,
    min_observations: usize,
    history_rows: Option<usize>,
}

impl<'a> PriceTableBuilder<'a> {
    pub fn new(source: &'a dyn PriceSource) -> Self {
        Self {
            source,
            min_observations: 1,
            history_rows: None,
        }
    }

    /// Tickers with fewer rows than this are left out of the table.
    pub fn with_min_observations(mut self, min_observations: usize) -> Self {
        self.min_observations = min_observations.max(1);
        self
    }

    /// Keep only each ticker's most recent `rows` closes. Applied before the
    /// `min_observations` check.
    pub fn with_history_rows(mut self, rows: Option<usize>) -> Self {
        self.history_rows = rows;
        self
    }

    /// Fetches every ticker and aligns the survivors on the union of their
    /// dates. Failed or short fetches are logged and skipped, never returned as
    /// errors; an empty universe therefore yields an empty table, which the
    /// calculators reject.
    pub async fn build(&self, tickers: &[String], start: NaiveDate) -> PriceTable {
        let mut series: BTreeMap<String, BTreeMap<NaiveDate, f64>> = BTreeMap::new();
        let mut failed = 0usize;
        let mut short = 0usize;

        for (idx, ticker) in tickers.iter().enumerate() {
            let fetched = self
                .source
                .fetch_closes(ticker, start)
                .await
                .map(|closes| keep_last(closes, self.history_rows));
            match fetched {
                Ok(closes) if closes.len() >= self.min_observations => {
                    tracing::debug!(ticker = %ticker, rows = closes.len(), "Fetched closes");
                    series.insert(ticker.clone(), closes);
                }
                Ok(closes) => {
                    short += 1;
                    tracing::warn!(
                        ticker = %ticker,
                        rows = closes.len(),
                        required = self.min_observations,
                        "Excluding ticker with too little history"
                    );
                }
                Err(e) => {
                    failed += 1;
                    tracing::warn!(ticker = %ticker, error = %e, "Excluding ticker whose fetch failed");
                }
            }

            if (idx + 1) % 100 == 0 {
                tracing::info!(done = idx + 1, total = tickers.len(), "Fetching prices");
            }
        }

        let table = PriceTable::from_ticker_series(series);
        tracing::info!(
            tickers = table.ticker_count(),
            dates = table.len(),
            last_date = ?table.last_date(),
            failed,
            short,
            "Built price table"
        );
        table
    }
}

fn keep_last(mut closes: BTreeMap<NaiveDate, f64>, rows: Option<usize>) -> BTreeMap<NaiveDate, f64> {
    let Some(rows) = rows else {
        return closes;
    };
    match closes.keys().rev().nth(rows.saturating_sub(1)).copied() {
        Some(first_kept) if closes.len() > rows => closes.split_off(&first_kept),
        _ => closes,
    }
}
