//! Min-max scaling fitted per run
//!
//! The scaler is refitted on every input, so magnitudes computed on scaled
//! data are only comparable within one run.

use crate::{Error, Result};

/// Maps the observed range of a sample onto `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinMaxScaler {
    min: f64,
    max: f64,
}

impl MinMaxScaler {
    /// Fit on the given values
    pub fn fit(values: &[f64]) -> Result<Self> {
        if values.is_empty() {
            return Err(Error::empty_input());
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(Error::non_finite("scaler input"));
        }
        let (min, max) = values
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });
        Ok(Self { min, max })
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    /// Scale one value; a constant sample maps everything to 0
    pub fn transform_one(&self, value: f64) -> f64 {
        let range = self.max - self.min;
        if range == 0.0 {
            0.0
        } else {
            (value - self.min) / range
        }
    }

    pub fn transform(&self, values: &[f64]) -> Vec<f64> {
        values.iter().map(|&v| self.transform_one(v)).collect()
    }

    pub fn inverse_one(&self, scaled: f64) -> f64 {
        self.min + scaled * (self.max - self.min)
    }

    /// Fit and transform in one step
    pub fn fit_transform(values: &[f64]) -> Result<(Self, Vec<f64>)> {
        let scaler = Self::fit(values)?;
        let scaled = scaler.transform(values);
        Ok((scaler, scaled))
    }
}
