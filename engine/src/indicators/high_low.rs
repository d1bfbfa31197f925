// New highs minus new lows over a trailing lookback (52 weeks by default)
use serde_json::Value;
use shared::models::CountSeries;

use super::rolling::RollingExtremes;
use super::BreadthIndicator;
use crate::error::Result;
use crate::models::PriceTable;

pub const DEFAULT_LOOKBACK: usize = 252;

pub struct HighLowNet {
    name: String,
    lookback: usize,
}

impl HighLowNet {
    pub fn new(lookback: usize) -> Self {
        Self {
            name: format!("HighLowNet({})", lookback),
            lookback,
        }
    }
}

impl Default for HighLowNet {
    fn default() -> Self {
        Self::new(DEFAULT_LOOKBACK)
    }
}

impl BreadthIndicator for HighLowNet {
    type Value = i64;

    fn name(&self) -> &str {
        &self.name
    }

    fn parameters(&self) -> Value {
        serde_json::json!({ "lookback": self.lookback })
    }

    fn calculate(&self, prices: &PriceTable) -> Result<CountSeries> {
        high_low_net(prices, self.lookback)
    }
}

/// Tickers at or above their trailing `lookback` maximum minus tickers at or
/// below their trailing minimum. A ticker whose whole window is flat is at
/// both extremes and counts on both sides.
pub fn high_low_net(prices: &PriceTable, lookback: usize) -> Result<CountSeries> {
    let rolling = RollingExtremes::new(lookback)?;
    prices.validate()?;

    let mut net = vec![0i64; prices.len()];

    for column in prices.columns() {
        let extremes = rolling.calculate(column);
        for (row, (price, window)) in column.iter().zip(&extremes).enumerate() {
            if let (Some(price), Some(window)) = (price, window) {
                if *price >= window.max {
                    net[row] += 1;
                }
                if *price <= window.min {
                    net[row] -= 1;
                }
            }
        }
    }

    Ok(CountSeries::new(prices.dates().to_vec(), net.into_iter().map(Some).collect()))
}
