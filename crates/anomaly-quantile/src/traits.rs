//! Core traits for quantile estimation

use crate::{Error, Result};
use num_traits::Float;
use std::cmp::Ordering;

/// Main trait for quantile estimation
pub trait QuantileEstimator<T: Float = f64> {
    /// Short name of the estimation rule
    fn name(&self) -> &'static str;

    /// Estimate a single quantile
    ///
    /// # Warning
    /// This method will sort the data in place! If you need to preserve the original
    /// order, use `quantile_sorted()` with pre-sorted data or make a copy first.
    ///
    /// # Arguments
    /// * `data` - The data sample (will be sorted in place)
    /// * `p` - The probability (0.0 to 1.0)
    fn quantile(&self, data: &mut [T], p: f64) -> Result<T> {
        sort_finite(data)?;
        self.quantile_sorted(data, p)
    }

    /// Estimate a single quantile from pre-sorted data
    fn quantile_sorted(&self, sorted_data: &[T], p: f64) -> Result<T>;

    /// Estimate multiple quantiles, sorting once
    fn quantiles(&self, data: &mut [T], ps: &[f64]) -> Result<Vec<T>> {
        sort_finite(data)?;
        self.quantiles_sorted(data, ps)
    }

    /// Estimate multiple quantiles from pre-sorted data
    fn quantiles_sorted(&self, sorted_data: &[T], ps: &[f64]) -> Result<Vec<T>> {
        ps.iter()
            .map(|&p| self.quantile_sorted(sorted_data, p))
            .collect()
    }
}

/// Sort in place after rejecting NaN and infinite values
pub fn sort_finite<T: Float>(data: &mut [T]) -> Result<()> {
    Error::check_non_empty(data)?;
    if data.iter().any(|v| !v.is_finite()) {
        return Err(Error::NonFinite);
    }
    data.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    Ok(())
}
