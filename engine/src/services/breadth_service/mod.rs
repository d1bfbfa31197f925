// engine/src/services/breadth_service/mod.rs
// BreadthPipeline turns one price table into every configured series and
// writes them. Computation and writing live in sibling modules.
use std::collections::BTreeMap;
use std::path::Path;

use chrono::NaiveDate;
use shared::models::{BreadthSnapshot, CountSeries, PercentSeries};

use crate::error::Result;
use crate::indicators::high_low::DEFAULT_LOOKBACK;
use crate::models::PriceTable;

pub mod compute_report;
pub mod write_report;

/// Every series of one run, computed from the same table.
#[derive(Debug, Clone, PartialEq)]
pub struct BreadthReport {
    pub percent_above_ma: BTreeMap<usize, PercentSeries>,
    /// Empty unless the pipeline was asked for counts.
    pub count_above_ma: BTreeMap<usize, CountSeries>,
    pub high_low_net: CountSeries,
    pub advance_decline: CountSeries,
}

impl BreadthReport {
    pub fn last_date(&self) -> Option<NaiveDate> {
        self.advance_decline.latest().map(|(date, _)| date)
    }

    /// Latest row of each series, the same values a consumer reading the last
    /// line of each file would see.
    pub fn snapshot(&self, market: &str) -> Option<BreadthSnapshot> {
        let as_of = self.last_date()?;
        let percent_above_ma = self
            .percent_above_ma
            .iter()
            .map(|(window, series)| (*window, series.latest().and_then(|(_, v)| v)))
            .collect();

        Some(BreadthSnapshot {
            market: market.to_string(),
            as_of,
            percent_above_ma,
            high_low_net: self.high_low_net.latest().and_then(|(_, v)| v).unwrap_or(0),
            advance_decline: self.advance_decline.latest().and_then(|(_, v)| v).unwrap_or(0),
        })
    }
}

#[derive(Debug, Clone)]
pub struct BreadthPipeline {
    ma_windows: Vec<usize>,
    high_low_lookback: usize,
    count_above_ma: bool,
}

impl Default for BreadthPipeline {
    fn default() -> Self {
        Self::new(vec![20, 60, 120, 200], DEFAULT_LOOKBACK)
    }
}

impl BreadthPipeline {
    pub fn new(ma_windows: Vec<usize>, high_low_lookback: usize) -> Self {
        Self {
            ma_windows,
            high_low_lookback,
            count_above_ma: false,
        }
    }

    /// Also produce the number of tickers above each MA.
    pub fn with_count_above_ma(mut self, enabled: bool) -> Self {
        self.count_above_ma = enabled;
        self
    }

    pub fn ma_windows(&self) -> &[usize] {
        &self.ma_windows
    }

    pub fn compute(&self, prices: &PriceTable) -> Result<BreadthReport> {
        compute_report::handle_compute_report(prices, &self.ma_windows, self.high_low_lookback, self.count_above_ma)
    }

    /// Computes everything first; files are only touched once all series exist.
    pub fn run(&self, prices: &PriceTable, output_dir: &Path) -> Result<BreadthReport> {
        let report = self.compute(prices)?;
        write_report::handle_write_report(&report, output_dir)?;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BreadthError;
    use shared::utils::{breadth_count_file_name, breadth_file_name, ADVANCE_DECLINE_FILE, HIGH_LOW_FILE};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn scenario_table() -> PriceTable {
        PriceTable::new(
            (1..=5).map(day).collect(),
            vec![
                ("A".to_string(), vec![Some(10.0), Some(11.0), Some(12.0), Some(13.0), Some(14.0)]),
                ("B".to_string(), vec![Some(20.0), Some(19.0), Some(18.0), Some(17.0), Some(16.0)]),
                ("C".to_string(), vec![Some(5.0), Some(5.0), Some(5.0), Some(5.0), Some(5.0)]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_run_writes_every_file() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = BreadthPipeline::new(vec![2, 3], 3);

        let report = pipeline.run(&scenario_table(), dir.path()).unwrap();

        for name in [breadth_file_name(2), breadth_file_name(3), HIGH_LOW_FILE.to_string(), ADVANCE_DECLINE_FILE.to_string()] {
            assert!(dir.path().join(&name).is_file(), "missing {}", name);
        }
        let breadth = std::fs::read_to_string(dir.path().join(breadth_file_name(2))).unwrap();
        assert_eq!(breadth.lines().nth(3), Some("2024-01-03,33.33"));
        assert_eq!(breadth.lines().last(), Some("2024-01-05,33.33"));

        // Day 3 closes the window: A new high, B new low, C both.
        let high_low = std::fs::read_to_string(dir.path().join(HIGH_LOW_FILE)).unwrap();
        assert_eq!(high_low.lines().nth(3), Some("2024-01-03,0"));

        let snapshot = report.snapshot("TEST").unwrap();
        assert_eq!(snapshot.as_of, day(5));
        assert_eq!(snapshot.advance_decline, 0);
        assert!((snapshot.percent_above_ma[&2].unwrap() - 100.0 / 3.0).abs() < 1e-9);
        assert!(report.count_above_ma.is_empty());
        assert!(!dir.path().join(breadth_count_file_name(2)).exists());
    }

    #[test]
    fn test_run_writes_counts_when_enabled() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = BreadthPipeline::new(vec![2], 3).with_count_above_ma(true);

        let report = pipeline.run(&scenario_table(), dir.path()).unwrap();

        assert_eq!(report.count_above_ma[&2].values, vec![Some(0), Some(1), Some(1), Some(1), Some(1)]);
        let counts = std::fs::read_to_string(dir.path().join(breadth_count_file_name(2))).unwrap();
        assert_eq!(counts, "date,value\n2024-01-01,0\n2024-01-02,1\n2024-01-03,1\n2024-01-04,1\n2024-01-05,1\n");
    }

    #[test]
    fn test_failed_write_keeps_previous_run() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = BreadthPipeline::new(vec![2], 3);
        let previous = "date,percent\n2023-12-29,50.00\n";
        std::fs::write(dir.path().join(breadth_file_name(2)), previous).unwrap();
        // A directory in the way of the last staged file makes its write fail.
        std::fs::create_dir(dir.path().join(format!("{}.tmp", ADVANCE_DECLINE_FILE))).unwrap();

        assert!(pipeline.run(&scenario_table(), dir.path()).is_err());

        assert_eq!(std::fs::read_to_string(dir.path().join(breadth_file_name(2))).unwrap(), previous);
        assert!(!dir.path().join(HIGH_LOW_FILE).exists());
        assert!(!dir.path().join(format!("{}.tmp", breadth_file_name(2))).exists());
        assert!(!dir.path().join(format!("{}.tmp", HIGH_LOW_FILE)).exists());
    }

    #[test]
    fn test_run_is_byte_identical_across_runs() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = BreadthPipeline::new(vec![2], 2);
        let table = scenario_table();

        pipeline.run(&table, dir.path()).unwrap();
        let first = std::fs::read(dir.path().join(ADVANCE_DECLINE_FILE)).unwrap();
        let first_breadth = std::fs::read(dir.path().join(breadth_file_name(2))).unwrap();
        pipeline.run(&table, dir.path()).unwrap();

        assert_eq!(first, std::fs::read(dir.path().join(ADVANCE_DECLINE_FILE)).unwrap());
        assert_eq!(first_breadth, std::fs::read(dir.path().join(breadth_file_name(2))).unwrap());
    }

    #[test]
    fn test_invalid_table_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let table = PriceTable::new(
            vec![day(1), day(2), day(2)],
            vec![("A".to_string(), vec![Some(1.0), Some(2.0), Some(3.0)])],
        )
        .unwrap();

        let result = BreadthPipeline::default().run(&table, dir.path());

        assert!(matches!(result, Err(BreadthError::InvalidInput(_))));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
