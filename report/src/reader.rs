// Reads the persisted breadth series back. Charts use whole files, the
// narrative only the last row of each.
use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use serde::Deserialize;
use shared::models::{BreadthSnapshot, CountSeries, PercentSeries, Series};
use shared::utils::{breadth_file_name, round2, ADVANCE_DECLINE_FILE, HIGH_LOW_FILE};

#[derive(Deserialize)]
struct PercentRow {
    date: NaiveDate,
    percent: Option<f64>,
}

#[derive(Deserialize)]
struct CountRow {
    date: NaiveDate,
    value: Option<i64>,
}

pub fn read_percent_series(path: impl AsRef<Path>) -> Result<PercentSeries> {
    let path = path.as_ref();
    let mut rdr = csv::Reader::from_path(path).with_context(|| format!("Failed to open '{}'", path.display()))?;

    let mut dates = Vec::new();
    let mut values = Vec::new();
    for (idx, row) in rdr.deserialize::<PercentRow>().enumerate() {
        let row = row.with_context(|| format!("Error reading '{}' at line {}", path.display(), idx + 2))?;
        dates.push(row.date);
        values.push(row.percent);
    }
    Ok(Series::new(dates, values))
}

pub fn read_count_series(path: impl AsRef<Path>) -> Result<CountSeries> {
    let path = path.as_ref();
    let mut rdr = csv::Reader::from_path(path).with_context(|| format!("Failed to open '{}'", path.display()))?;

    let mut dates = Vec::new();
    let mut values = Vec::new();
    for (idx, row) in rdr.deserialize::<CountRow>().enumerate() {
        let row = row.with_context(|| format!("Error reading '{}' at line {}", path.display(), idx + 2))?;
        dates.push(row.date);
        values.push(row.value);
    }
    Ok(Series::new(dates, values))
}

/// Latest value of every series in `dir`. The as-of date is the last row of
/// the advance-decline file; all files of one run end on the same date.
pub fn read_snapshot(dir: impl AsRef<Path>, market: &str, windows: &[usize]) -> Result<BreadthSnapshot> {
    let dir = dir.as_ref();

    let advance_decline = read_count_series(dir.join(ADVANCE_DECLINE_FILE))?;
    let (as_of, ad_level) = advance_decline
        .latest()
        .ok_or_else(|| anyhow!("'{}' has no rows", ADVANCE_DECLINE_FILE))?;

    let high_low = read_count_series(dir.join(HIGH_LOW_FILE))?;
    let high_low_net = latest_on(&high_low, as_of, HIGH_LOW_FILE)?;

    let mut percent_above_ma = BTreeMap::new();
    for &window in windows {
        let name = breadth_file_name(window);
        let series = read_percent_series(dir.join(&name))?;
        let latest = latest_on(&series, as_of, &name)?;
        percent_above_ma.insert(window, latest.map(round2));
    }

    Ok(BreadthSnapshot {
        market: market.to_string(),
        as_of,
        percent_above_ma,
        high_low_net: high_low_net.unwrap_or(0),
        advance_decline: ad_level.unwrap_or(0),
    })
}

fn latest_on<T: Copy>(series: &Series<T>, as_of: NaiveDate, name: &str) -> Result<Option<T>> {
    match series.latest() {
        Some((date, value)) if date == as_of => Ok(value),
        Some((date, _)) => Err(anyhow!("'{}' ends on {} but the run ends on {}", name, date, as_of)),
        None => Err(anyhow!("'{}' has no rows", name)),
    }
}
