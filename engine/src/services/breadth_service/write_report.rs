// Handler persisting a computed report with the on-disk schema from shared::utils
use std::fs;
use std::path::Path;

use shared::utils::{breadth_count_file_name, breadth_file_name, ADVANCE_DECLINE_FILE, HIGH_LOW_FILE};

use super::BreadthReport;
use crate::data::output::{stage_count_series, stage_percent_series, StagedFile};
use crate::error::Result;

/// Every file is staged before any target is replaced, so a failed write
/// leaves the previous run's files untouched.
pub fn handle_write_report(report: &BreadthReport, output_dir: &Path) -> Result<()> {
    fs::create_dir_all(output_dir)?;

    let mut staged = Vec::new();
    if let Err(e) = stage_report(report, output_dir, &mut staged) {
        staged.into_iter().for_each(StagedFile::discard);
        return Err(e);
    }

    let files = staged.len();
    for file in staged {
        file.commit()?;
    }

    tracing::info!(
        dir = %output_dir.display(),
        files,
        last_date = ?report.last_date(),
        "Wrote breadth series"
    );
    Ok(())
}

fn stage_report(report: &BreadthReport, output_dir: &Path, staged: &mut Vec<StagedFile>) -> Result<()> {
    for (window, series) in &report.percent_above_ma {
        staged.push(stage_percent_series(output_dir.join(breadth_file_name(*window)), series)?);
    }
    for (window, series) in &report.count_above_ma {
        staged.push(stage_count_series(output_dir.join(breadth_count_file_name(*window)), series)?);
    }
    staged.push(stage_count_series(output_dir.join(HIGH_LOW_FILE), &report.high_low_net)?);
    staged.push(stage_count_series(output_dir.join(ADVANCE_DECLINE_FILE), &report.advance_decline)?);
    Ok(())
}
