// Advance/Decline line: cumulative (advancers - decliners)
use serde_json::Value;
use shared::models::CountSeries;

use super::BreadthIndicator;
use crate::error::Result;
use crate::models::PriceTable;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AdvanceDeclineDay {
    pub advances: usize,
    pub declines: usize,
}

impl AdvanceDeclineDay {
    pub fn net(&self) -> i64 {
        self.advances as i64 - self.declines as i64
    }
}

#[derive(Default)]
pub struct AdvanceDeclineLine;

impl AdvanceDeclineLine {
    pub fn new() -> Self {
        Self
    }
}

impl BreadthIndicator for AdvanceDeclineLine {
    type Value = i64;

    fn name(&self) -> &str {
        "AdvanceDecline"
    }

    fn parameters(&self) -> Value {
        serde_json::json!({})
    }

    fn calculate(&self, prices: &PriceTable) -> Result<CountSeries> {
        advance_decline_line(prices)
    }
}

/// Per-date advancers and decliners against the previous table row. A ticker
/// needs a price on both rows to count; unchanged prices count as neither.
/// The first row has no predecessor and is always zero.
pub fn advance_decline_counts(prices: &PriceTable) -> Result<Vec<AdvanceDeclineDay>> {
    prices.validate()?;

    let mut days = vec![AdvanceDeclineDay::default(); prices.len()];

    for column in prices.columns() {
        for (row, pair) in column.windows(2).enumerate() {
            if let (Some(previous), Some(current)) = (pair[0], pair[1]) {
                if current > previous {
                    days[row + 1].advances += 1;
                } else if current < previous {
                    days[row + 1].declines += 1;
                }
            }
        }
    }

    Ok(days)
}

pub fn advance_decline_line(prices: &PriceTable) -> Result<CountSeries> {
    let days = advance_decline_counts(prices)?;

    let values = days
        .iter()
        .scan(0i64, |line, day| {
            *line += day.net();
            Some(Some(*line))
        })
        .collect();

    Ok(CountSeries::new(prices.dates().to_vec(), values))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BreadthError;
    use crate::indicators::test_support::{day, table};

    #[test]
    fn test_ad_line_basic() {
        let prices = table(&[
            ("A", &[Some(10.0), Some(11.0), Some(12.0), Some(13.0), Some(14.0)]),
            ("B", &[Some(20.0), Some(19.0), Some(18.0), Some(17.0), Some(16.0)]),
            ("C", &[Some(5.0), Some(5.0), Some(5.0), Some(5.0), Some(5.0)]),
            ("D", &[Some(1.0), Some(2.0), Some(3.0), Some(2.0), Some(3.0)]),
        ]);

        let series = advance_decline_line(&prices).unwrap();

        // Nets per day: 0, +1, +1, -1, +1
        assert_eq!(series.values, vec![Some(0), Some(1), Some(2), Some(1), Some(2)]);
    }

    #[test]
    fn test_delta_matches_counts() {
        let prices = table(&[
            ("A", &[Some(3.0), Some(1.0), Some(4.0), None, Some(5.0), Some(9.0)]),
            ("B", &[None, Some(6.0), Some(2.0), Some(6.0), Some(5.0), Some(3.0)]),
            ("C", &[Some(5.0), Some(8.0), Some(9.0), Some(7.0), Some(9.0), Some(3.0)]),
        ]);

        let days = advance_decline_counts(&prices).unwrap();
        let series = advance_decline_line(&prices).unwrap();

        assert_eq!(days[0], AdvanceDeclineDay::default());
        assert_eq!(series.values[0], Some(0));
        for row in 1..series.len() {
            let delta = series.values[row].unwrap() - series.values[row - 1].unwrap();
            assert_eq!(delta, days[row].net());
        }
    }

    #[test]
    fn test_missing_to_present_counts_as_neither() {
        let prices = table(&[
            ("A", &[None, Some(5.0), None, Some(9.0)]),
            ("B", &[Some(2.0), Some(1.0), Some(1.0), Some(3.0)]),
        ]);

        let days = advance_decline_counts(&prices).unwrap();

        assert_eq!(days[1], AdvanceDeclineDay { advances: 0, declines: 1 });
        assert_eq!(days[2], AdvanceDeclineDay { advances: 0, declines: 0 });
        assert_eq!(days[3], AdvanceDeclineDay { advances: 1, declines: 0 });
    }

    #[test]
    fn test_duplicate_dates_fail_fast() {
        let prices = PriceTable::new(
            vec![day(1), day(1)],
            vec![("A".to_string(), vec![Some(1.0), Some(2.0)])],
        )
        .unwrap();
        assert!(matches!(advance_decline_line(&prices), Err(BreadthError::InvalidInput(_))));
    }

    #[test]
    fn test_single_row() {
        let prices = table(&[("A", &[Some(1.0)])]);
        assert_eq!(advance_decline_line(&prices).unwrap().values, vec![Some(0)]);
    }
}
