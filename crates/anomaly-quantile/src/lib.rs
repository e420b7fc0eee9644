//! Percentile estimation for anomaly thresholds
//!
//! Scorers in this workspace turn a distribution of scores into a threshold
//! by taking a percentile of that same distribution. This crate provides the
//! estimators and the [`PercentileThreshold`] helper built on them.
//!
//! # Example
//!
//! ```rust
//! use anomaly_quantile::{percentile, PercentileThreshold};
//!
//! let errors: Vec<f64> = (1..=20).map(|i| i as f64 / 100.0).collect();
//! let p95 = percentile(&errors, 95.0).unwrap();
//! assert!((p95 - 0.1905).abs() < 1e-12);
//!
//! let (threshold, flags) = PercentileThreshold::default().fit_flag(&errors).unwrap();
//! assert_eq!(threshold, p95);
//! assert_eq!(flags.iter().filter(|&&f| f).count(), 1);
//! ```

pub mod error;
pub mod estimators;
pub mod threshold;
pub mod traits;

// Re-export main types
pub use error::{Error, Result};
pub use estimators::{LinearInterpolation, NearestRank};
pub use threshold::{flag_above, PercentileThreshold, DEFAULT_PERCENTILE};
pub use traits::QuantileEstimator;

/// Percentile `q` in `[0, 100]` of `data` by linear interpolation
pub fn percentile(data: &[f64], q: f64) -> Result<f64> {
    let mut sorted = data.to_vec();
    LinearInterpolation.quantile(&mut sorted, q / 100.0)
}
