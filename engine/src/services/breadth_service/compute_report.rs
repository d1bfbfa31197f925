// Handler computing every series of a run
use std::collections::BTreeMap;
use std::time::Instant;

use super::BreadthReport;
use crate::error::Result;
use crate::indicators::{AdvanceDeclineLine, BreadthIndicator, CountAboveMa, HighLowNet, PercentAboveMa};
use crate::models::PriceTable;

pub fn handle_compute_report(
    prices: &PriceTable,
    ma_windows: &[usize],
    lookback: usize,
    with_counts: bool,
) -> Result<BreadthReport> {
    // Fail before any indicator work if the table itself is broken.
    prices.validate()?;
    let started = Instant::now();

    let mut percent_above_ma = BTreeMap::new();
    for &window in ma_windows {
        let indicator = PercentAboveMa::new(window);
        let series = indicator.calculate(prices)?;
        tracing::info!(
            indicator = %indicator.name(),
            parameters = %indicator.parameters(),
            latest = ?series.latest(),
            "Computed breadth series"
        );
        percent_above_ma.insert(window, series);
    }

    let mut count_above_ma = BTreeMap::new();
    if with_counts {
        for &window in ma_windows {
            let indicator = CountAboveMa::new(window);
            let series = indicator.calculate(prices)?;
            tracing::info!(indicator = %indicator.name(), latest = ?series.latest(), "Computed breadth series");
            count_above_ma.insert(window, series);
        }
    }

    let high_low = HighLowNet::new(lookback);
    let high_low_net = high_low.calculate(prices)?;
    tracing::info!(
        indicator = %high_low.name(),
        parameters = %high_low.parameters(),
        latest = ?high_low_net.latest(),
        "Computed breadth series"
    );

    let ad_line = AdvanceDeclineLine::new();
    let advance_decline = ad_line.calculate(prices)?;
    tracing::info!(indicator = %ad_line.name(), latest = ?advance_decline.latest(), "Computed breadth series");

    tracing::debug!(
        tickers = prices.ticker_count(),
        dates = prices.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Breadth computation finished"
    );

    Ok(BreadthReport {
        percent_above_ma,
        count_above_ma,
        high_low_net,
        advance_decline,
    })
}
