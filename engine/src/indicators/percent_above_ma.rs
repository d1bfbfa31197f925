// Percentage of constituents trading above their own moving average
use serde_json::Value;
use shared::models::{CountSeries, PercentSeries};

use super::sma::Sma;
use super::BreadthIndicator;
use crate::error::Result;
use crate::models::PriceTable;

pub struct PercentAboveMa {
    name: String,
    window: usize,
}

impl PercentAboveMa {
    pub fn new(window: usize) -> Self {
        Self {
            name: format!("%>MA({})", window),
            window,
        }
    }
}

impl BreadthIndicator for PercentAboveMa {
    type Value = f64;

    fn name(&self) -> &str {
        &self.name
    }

    fn parameters(&self) -> Value {
        serde_json::json!({ "window": self.window })
    }

    fn calculate(&self, prices: &PriceTable) -> Result<PercentSeries> {
        percent_above_ma(prices, self.window)
    }
}

/// Number of tickers strictly above their `window`-day MA on every date.
/// Only tickers with both a price and an MA that day are looked at, so dates
/// where nobody has a full window count 0.
pub struct CountAboveMa {
    name: String,
    window: usize,
}

impl CountAboveMa {
    pub fn new(window: usize) -> Self {
        Self {
            name: format!("#>MA({})", window),
            window,
        }
    }
}

impl BreadthIndicator for CountAboveMa {
    type Value = i64;

    fn name(&self) -> &str {
        &self.name
    }

    fn parameters(&self) -> Value {
        serde_json::json!({ "window": self.window })
    }

    fn calculate(&self, prices: &PriceTable) -> Result<CountSeries> {
        count_above_ma(prices, self.window)
    }
}

// Relative slack for the price/MA comparison. A flat window can average to a
// value a few ulps away from the price itself.
const EQUALITY_TOLERANCE: f64 = 1e-12;

/// Strictly above, with `price == average` up to rounding counting as equal.
fn is_above(price: f64, average: f64) -> bool {
    price - average > average.abs() * EQUALITY_TOLERANCE
}

struct AboveTally {
    above: Vec<usize>,
    eligible: Vec<usize>,
}

fn tally_above_ma(prices: &PriceTable, window: usize) -> Result<AboveTally> {
    let sma = Sma::new(window)?;
    prices.validate()?;

    let rows = prices.len();
    let mut tally = AboveTally {
        above: vec![0; rows],
        eligible: vec![0; rows],
    };

    for column in prices.columns() {
        let averages = sma.calculate(column);
        for (row, (price, average)) in column.iter().zip(&averages).enumerate() {
            if let (Some(price), Some(average)) = (price, average) {
                tally.eligible[row] += 1;
                if is_above(*price, *average) {
                    tally.above[row] += 1;
                }
            }
        }
    }
    Ok(tally)
}

/// For every date: tickers strictly above their `window`-day MA divided by the
/// tickers that have both a price and an MA that day, times 100.
///
/// Dates where no ticker has a defined MA yet are `None`.
pub fn percent_above_ma(prices: &PriceTable, window: usize) -> Result<PercentSeries> {
    let tally = tally_above_ma(prices, window)?;

    let values = tally
        .above
        .iter()
        .zip(&tally.eligible)
        .map(|(&above, &eligible)| {
            if eligible == 0 {
                None
            } else {
                Some(above as f64 / eligible as f64 * 100.0)
            }
        })
        .collect();

    Ok(PercentSeries::new(prices.dates().to_vec(), values))
}

pub fn count_above_ma(prices: &PriceTable, window: usize) -> Result<CountSeries> {
    let tally = tally_above_ma(prices, window)?;
    let values = tally.above.iter().map(|&above| Some(above as i64)).collect();
    Ok(CountSeries::new(prices.dates().to_vec(), values))
}
