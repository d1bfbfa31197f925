// Trailing max/min over the last `lookback` observations of a column
use moving_min_max::{MovingMax, MovingMin};

use crate::error::{BreadthError, Result};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extremes {
    pub max: f64,
    pub min: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct RollingExtremes {
    lookback: usize,
}

impl RollingExtremes {
    pub fn new(lookback: usize) -> Result<Self> {
        if lookback == 0 {
            return Err(BreadthError::InvalidInput("lookback must be greater than 0".to_string()));
        }
        Ok(Self { lookback })
    }

    /// Per-row extremes of the window ending at (and including) that row.
    /// `None` on missing cells and until `lookback` observations were seen.
    pub fn calculate(&self, column: &[Option<f64>]) -> Vec<Option<Extremes>> {
        let mut highs = MovingMax::<f64>::new();
        let mut lows = MovingMin::<f64>::new();
        let mut results = Vec::with_capacity(column.len());

        for cell in column {
            let Some(price) = *cell else {
                results.push(None);
                continue;
            };

            highs.push(price);
            lows.push(price);
            if highs.len() > self.lookback {
                highs.pop();
                lows.pop();
            }

            if highs.len() < self.lookback {
                results.push(None);
                continue;
            }

            let extremes = highs.max().copied().zip(lows.min().copied());
            results.push(extremes.map(|(max, min)| Extremes { max, min }));
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_slides() {
        let rolling = RollingExtremes::new(3).unwrap();
        let column = [Some(5.0), Some(1.0), Some(3.0), Some(2.0), Some(4.0)];
        let results = rolling.calculate(&column);

        assert_eq!(results[0], None);
        assert_eq!(results[1], None);
        assert_eq!(results[2], Some(Extremes { max: 5.0, min: 1.0 }));
        assert_eq!(results[3], Some(Extremes { max: 3.0, min: 1.0 }));
        assert_eq!(results[4], Some(Extremes { max: 4.0, min: 2.0 }));
    }

    #[test]
    fn test_missing_cells_are_not_observations() {
        let rolling = RollingExtremes::new(2).unwrap();
        let column = [Some(5.0), None, Some(7.0), None];
        let results = rolling.calculate(&column);

        assert_eq!(results, vec![None, None, Some(Extremes { max: 7.0, min: 5.0 }), None]);
    }

    #[test]
    fn test_zero_lookback_is_invalid() {
        assert!(matches!(RollingExtremes::new(0), Err(BreadthError::InvalidInput(_))));
    }
}
