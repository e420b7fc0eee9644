//! Percentile thresholds over a run's own score distribution
//!
//! The threshold is recomputed from the scores of every run and never
//! persisted; roughly `100 - percentile` percent of the scores end up above
//! it, fewer when many scores tie at the threshold.

use crate::estimators::LinearInterpolation;
use crate::traits::QuantileEstimator;
use crate::{Error, Result};
use tracing::debug;

/// Default percentile for reconstruction-error thresholds
pub const DEFAULT_PERCENTILE: f64 = 95.0;

/// Flags scores strictly above a percentile of their own distribution
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PercentileThreshold<Q = LinearInterpolation> {
    percentile: f64,
    estimator: Q,
}

impl Default for PercentileThreshold {
    fn default() -> Self {
        Self {
            percentile: DEFAULT_PERCENTILE,
            estimator: LinearInterpolation,
        }
    }
}

impl PercentileThreshold {
    /// Threshold at `percentile` in `(0, 100)` using linear interpolation
    pub fn new(percentile: f64) -> Result<Self> {
        Self::with_estimator(percentile, LinearInterpolation)
    }
}

impl<Q: QuantileEstimator<f64>> PercentileThreshold<Q> {
    /// Threshold using a specific estimator
    pub fn with_estimator(percentile: f64, estimator: Q) -> Result<Self> {
        if !(percentile > 0.0 && percentile < 100.0) {
            return Err(Error::InvalidPercentile { percentile });
        }
        Ok(Self {
            percentile,
            estimator,
        })
    }

    pub fn percentile(&self) -> f64 {
        self.percentile
    }

    /// Compute the threshold value for these scores
    pub fn fit(&self, scores: &[f64]) -> Result<f64> {
        let mut sorted = scores.to_vec();
        let threshold = self.estimator.quantile(&mut sorted, self.percentile / 100.0)?;
        debug!(
            percentile = self.percentile,
            estimator = self.estimator.name(),
            samples = scores.len(),
            threshold,
            "fitted percentile threshold"
        );
        Ok(threshold)
    }

    /// Fit on the scores and flag them in one pass
    pub fn fit_flag(&self, scores: &[f64]) -> Result<(f64, Vec<bool>)> {
        let threshold = self.fit(scores)?;
        Ok((threshold, flag_above(scores, threshold)))
    }
}

/// Flag every score strictly greater than `threshold`
pub fn flag_above(scores: &[f64], threshold: f64) -> Vec<bool> {
    scores.iter().map(|&s| s > threshold).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimators::NearestRank;

    #[test]
    fn test_rejects_bad_percentile() {
        assert!(PercentileThreshold::new(0.0).is_err());
        assert!(PercentileThreshold::new(100.0).is_err());
        assert!(PercentileThreshold::new(f64::NAN).is_err());
        assert!(PercentileThreshold::new(95.0).is_ok());
    }

    #[test]
    fn test_fit_flag_on_uniform_grid() {
        let scores: Vec<f64> = (0..100).map(f64::from).collect();
        let (threshold, flags) = PercentileThreshold::default().fit_flag(&scores).unwrap();
        assert!((threshold - 94.05).abs() < 1e-9);
        assert_eq!(flags.iter().filter(|&&f| f).count(), 5);
        assert!(flags[95] && !flags[94]);
    }

    #[test]
    fn test_ties_are_not_flagged() {
        let scores = vec![1.0; 50];
        let (threshold, flags) = PercentileThreshold::default().fit_flag(&scores).unwrap();
        assert_eq!(threshold, 1.0);
        assert!(flags.iter().all(|&f| !f));
    }

    #[test]
    fn test_other_estimator() {
        let threshold = PercentileThreshold::with_estimator(50.0, NearestRank).unwrap();
        assert_eq!(threshold.fit(&[3.0, 1.0, 2.0, 4.0]).unwrap(), 2.0);
    }

    #[test]
    fn test_empty_scores() {
        assert_eq!(
            PercentileThreshold::default().fit(&[]),
            Err(Error::EmptyData)
        );
    }
}
