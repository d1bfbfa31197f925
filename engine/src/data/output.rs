// CSV writer for the derived series. Each file is staged next to its target
// and renamed over it on commit, so readers see either the previous run or this one.
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use csv::WriterBuilder;
use serde::Serialize;
use shared::models::{CountSeries, PercentSeries};
use shared::utils::{format_percent, PERCENT_COLUMN, VALUE_COLUMN};

use crate::error::Result;

#[derive(Serialize)]
struct PercentRow {
    date: NaiveDate,
    percent: Option<String>,
}

#[derive(Serialize)]
struct CountRow {
    date: NaiveDate,
    value: Option<i64>,
}

/// A series fully written to its `.tmp` sibling, waiting to replace the target.
#[derive(Debug)]
pub struct StagedFile {
    tmp_path: PathBuf,
    target: PathBuf,
}

impl StagedFile {
    pub fn commit(self) -> Result<()> {
        fs::rename(&self.tmp_path, &self.target)?;
        tracing::debug!(path = %self.target.display(), "Wrote series");
        Ok(())
    }

    pub fn discard(self) {
        if let Err(e) = fs::remove_file(&self.tmp_path) {
            tracing::warn!(path = %self.tmp_path.display(), error = %e, "Failed to remove staged file");
        }
    }
}

pub fn stage_percent_series(path: impl AsRef<Path>, series: &PercentSeries) -> Result<StagedFile> {
    let rows = series.iter().map(|(date, value)| PercentRow {
        date,
        percent: value.map(format_percent),
    });
    stage_rows(path.as_ref(), PERCENT_COLUMN, rows)
}

pub fn stage_count_series(path: impl AsRef<Path>, series: &CountSeries) -> Result<StagedFile> {
    let rows = series.iter().map(|(date, value)| CountRow { date, value });
    stage_rows(path.as_ref(), VALUE_COLUMN, rows)
}

pub fn write_percent_series(path: impl AsRef<Path>, series: &PercentSeries) -> Result<()> {
    stage_percent_series(path, series)?.commit()
}

pub fn write_count_series(path: impl AsRef<Path>, series: &CountSeries) -> Result<()> {
    stage_count_series(path, series)?.commit()
}

fn stage_rows<R: Serialize>(path: &Path, value_column: &str, rows: impl Iterator<Item = R>) -> Result<StagedFile> {
    let staged = StagedFile {
        tmp_path: tmp_path_for(path),
        target: path.to_path_buf(),
    };
    let file = File::create(&staged.tmp_path)?;
    if let Err(e) = write_csv(file, value_column, rows) {
        staged.discard();
        return Err(e);
    }
    Ok(staged)
}

fn write_csv<R: Serialize>(file: File, value_column: &str, rows: impl Iterator<Item = R>) -> Result<()> {
    let mut wtr = WriterBuilder::new().has_headers(false).from_writer(BufWriter::new(file));
    wtr.write_record(["date", value_column])?;
    for row in rows {
        wtr.serialize(row)?;
    }
    let mut inner = wtr.into_inner().map_err(|e| e.into_error())?;
    inner.flush()?;
    Ok(())
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
