// Simple Moving Average (SMA) over a ragged price column
use std::collections::VecDeque;

use crate::error::{BreadthError, Result};

/// Trailing mean of the last `period` *observed* prices.
///
/// Missing cells are skipped rather than treated as zero: they neither enter
/// the window nor produce an output value.
#[derive(Debug, Clone, Copy)]
pub struct Sma {
    period: usize,
}

impl Sma {
    pub fn new(period: usize) -> Result<Self> {
        if period == 0 {
            return Err(BreadthError::InvalidInput("SMA period must be greater than 0".to_string()));
        }
        Ok(Self { period })
    }

    pub fn period(&self) -> usize {
        self.period
    }

    pub fn calculate(&self, column: &[Option<f64>]) -> Vec<Option<f64>> {
        let mut window: VecDeque<f64> = VecDeque::with_capacity(self.period + 1);
        let mut results = Vec::with_capacity(column.len());

        for cell in column {
            let Some(price) = *cell else {
                results.push(None);
                continue;
            };

            window.push_back(price);
            if window.len() > self.period {
                window.pop_front();
            }

            if window.len() == self.period {
                // Summed fresh each step so the mean depends only on the window contents.
                let sum: f64 = window.iter().sum();
                results.push(Some(sum / self.period as f64));
            } else {
                results.push(None);
            }
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_option_vec_eq(a: &[Option<f64>], b: &[Option<f64>]) {
        assert_eq!(a.len(), b.len(), "Vectors differ in length");
        for (i, (val_a, val_b)) in a.iter().zip(b.iter()).enumerate() {
            match (val_a, val_b) {
                (None, None) => {}
                (Some(x), Some(y)) => assert!((x - y).abs() < 1e-9, "Mismatch at index {}: {} != {}", i, x, y),
                _ => panic!("Mismatch at index {}: {:?} != {:?}", i, val_a, val_b),
            }
        }
    }

    fn dense(values: &[f64]) -> Vec<Option<f64>> {
        values.iter().copied().map(Some).collect()
    }

    #[test]
    fn test_sma_calculation() {
        let sma = Sma::new(3).unwrap();
        let results = sma.calculate(&dense(&[1.0, 2.0, 3.0, 4.0, 5.0]));
        // expected: -, -, (1+2+3)/3=2.0, (2+3+4)/3=3.0, (3+4+5)/3=4.0
        assert_option_vec_eq(&results, &[None, None, Some(2.0), Some(3.0), Some(4.0)]);
    }

    #[test]
    fn test_sma_insufficient_data() {
        let sma = Sma::new(3).unwrap();
        let results = sma.calculate(&dense(&[1.0, 2.0]));
        assert_option_vec_eq(&results, &[None, None]);
    }

    #[test]
    fn test_sma_period_one() {
        let sma = Sma::new(1).unwrap();
        let results = sma.calculate(&dense(&[1.0, 2.0, 3.0]));
        assert_option_vec_eq(&results, &[Some(1.0), Some(2.0), Some(3.0)]);
    }

    #[test]
    fn test_sma_empty_data() {
        let sma = Sma::new(3).unwrap();
        assert!(sma.calculate(&[]).is_empty());
    }

    #[test]
    fn test_sma_skips_missing_cells() {
        let sma = Sma::new(2).unwrap();
        let column = [None, Some(2.0), None, Some(4.0), Some(6.0), None];
        let results = sma.calculate(&column);
        // The gap on day 3 does not reset the window: day 4 averages 2.0 and 4.0.
        assert_option_vec_eq(&results, &[None, None, None, Some(3.0), Some(5.0), None]);
    }

    #[test]
    fn test_sma_period_zero_is_invalid() {
        let err = Sma::new(0).unwrap_err();
        assert!(err.to_string().contains("SMA period must be greater than 0"));
    }
}
