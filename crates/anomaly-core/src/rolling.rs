//! Rolling mean and standard deviation features
//!
//! Rows before the first full window take the first full-window value
//! (back-fill), so every row carries a feature value.

use crate::utils::{mean, std_dev};
use crate::{Error, Result};

/// Default rolling window length
pub const DEFAULT_ROLLING_WINDOW: usize = 20;

/// Rolling features aligned one-to-one with the input values
#[derive(Debug, Clone, PartialEq)]
pub struct RollingFeatures {
    pub window: usize,
    pub mean: Vec<f64>,
    /// Sample standard deviation (n - 1 denominator)
    pub std: Vec<f64>,
}

impl RollingFeatures {
    /// Compute trailing-window features over `values`
    pub fn compute(values: &[f64], window: usize) -> Result<Self> {
        if window == 0 {
            return Err(Error::InvalidParameter(
                "rolling window must be at least 1".to_string(),
            ));
        }
        if values.len() < window {
            return Err(Error::insufficient(window, values.len()));
        }

        let full: Vec<(f64, f64)> = values
            .windows(window)
            .map(|w| (mean(w), std_dev(w)))
            .collect();
        let (first_mean, first_std) = full[0];

        let lead = window - 1;
        let mut mean_col = Vec::with_capacity(values.len());
        let mut std_col = Vec::with_capacity(values.len());
        mean_col.extend(std::iter::repeat(first_mean).take(lead));
        std_col.extend(std::iter::repeat(first_std).take(lead));
        for (m, s) in full {
            mean_col.push(m);
            std_col.push(s);
        }

        Ok(Self {
            window,
            mean: mean_col,
            std: std_col,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_backfill() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0];
        let features = RollingFeatures::compute(&values, 3).unwrap();
        assert_eq!(features.mean, vec![2.0, 2.0, 2.0, 3.0, 4.0]);
        assert_relative_eq!(features.std[0], 1.0);
        assert_relative_eq!(features.std[4], 1.0);
        assert_eq!(features.mean.len(), values.len());
    }

    #[test]
    fn test_window_longer_than_series() {
        assert!(matches!(
            RollingFeatures::compute(&[1.0, 2.0], 3),
            Err(Error::InsufficientData { expected: 3, actual: 2 })
        ));
    }
}
