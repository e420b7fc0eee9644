//! Order-statistic quantile estimators

use crate::traits::QuantileEstimator;
use crate::{Error, Result};
use num_traits::Float;

/// Linear interpolation between the two closest order statistics
///
/// Position `h = (n - 1) p`; the estimate is
/// `x[floor(h)] + (h - floor(h)) * (x[floor(h) + 1] - x[floor(h)])`.
/// This is Hyndman & Fan definition 7, the default of most array libraries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinearInterpolation;

impl<T: Float> QuantileEstimator<T> for LinearInterpolation {
    fn name(&self) -> &'static str {
        "linear"
    }

    fn quantile_sorted(&self, sorted_data: &[T], p: f64) -> Result<T> {
        Error::check_non_empty(sorted_data)?;
        Error::check_probability(p)?;

        let n = sorted_data.len();
        let h = (n - 1) as f64 * p;
        let lo = h.floor() as usize;
        if lo + 1 >= n {
            return Ok(sorted_data[n - 1]);
        }
        let frac = T::from(h - lo as f64).ok_or(Error::NonFinite)?;
        let a = sorted_data[lo];
        let b = sorted_data[lo + 1];
        Ok(a + frac * (b - a))
    }
}

/// Smallest order statistic whose empirical CDF reaches `p`
///
/// Hyndman & Fan definition 1; always returns an observed value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NearestRank;

impl<T: Float> QuantileEstimator<T> for NearestRank {
    fn name(&self) -> &'static str {
        "nearest_rank"
    }

    fn quantile_sorted(&self, sorted_data: &[T], p: f64) -> Result<T> {
        Error::check_non_empty(sorted_data)?;
        Error::check_probability(p)?;

        let n = sorted_data.len();
        let rank = (p * n as f64).ceil() as usize;
        Ok(sorted_data[rank.clamp(1, n) - 1])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_linear_matches_reference_values() {
        let data: [f64; 4] = [1.0, 2.0, 3.0, 4.0];
        let est = LinearInterpolation;
        assert_relative_eq!(est.quantile_sorted(&data, 0.5).unwrap(), 2.5);
        assert_relative_eq!(est.quantile_sorted(&data, 0.95).unwrap(), 3.85);
        assert_relative_eq!(est.quantile_sorted(&data, 0.0).unwrap(), 1.0);
        assert_relative_eq!(est.quantile_sorted(&data, 1.0).unwrap(), 4.0);
    }

    #[test]
    fn test_linear_single_element() {
        let est = LinearInterpolation;
        assert_eq!(est.quantile_sorted(&[42.0f64], 0.3).unwrap(), 42.0);
    }

    #[test]
    fn test_linear_f32() {
        let est = LinearInterpolation;
        let mut data = vec![4.0f32, 1.0, 3.0, 2.0];
        assert_relative_eq!(est.quantile(&mut data, 0.5).unwrap(), 2.5f32);
    }

    #[test]
    fn test_nearest_rank() {
        let data: [f64; 5] = [10.0, 20.0, 30.0, 40.0, 50.0];
        let est = NearestRank;
        assert_eq!(est.quantile_sorted(&data, 0.0).unwrap(), 10.0);
        assert_eq!(est.quantile_sorted(&data, 0.4).unwrap(), 20.0);
        assert_eq!(est.quantile_sorted(&data, 0.41).unwrap(), 30.0);
        assert_eq!(est.quantile_sorted(&data, 1.0).unwrap(), 50.0);
    }

    #[test]
    fn test_invalid_inputs() {
        let est = LinearInterpolation;
        assert_eq!(
            QuantileEstimator::<f64>::quantile_sorted(&est, &[], 0.5),
            Err(Error::EmptyData)
        );
        assert_eq!(
            est.quantile_sorted(&[1.0f64], -0.1),
            Err(Error::InvalidProbability { p: -0.1 })
        );
        let mut data: Vec<f64> = vec![1.0, f64::NAN];
        assert_eq!(est.quantile(&mut data, 0.5), Err(Error::NonFinite));
    }

    #[test]
    fn test_quantiles_sort_once() {
        let est = LinearInterpolation;
        let mut data: Vec<f64> = vec![5.0, 1.0, 4.0, 2.0, 3.0];
        let qs = est.quantiles(&mut data, &[0.0, 0.5, 1.0]).unwrap();
        assert_eq!(qs, vec![1.0, 3.0, 5.0]);
        assert_eq!(data, vec![1.0, 2.0, 3.0, 4.0, 5.0]);
    }
}
