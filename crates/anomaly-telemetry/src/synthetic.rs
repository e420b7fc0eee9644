//! Synthetic drifting sensor
//!
//! Produces `base + N(0, noise_std)` at integer timestamps, with a linear
//! ramp from 0 to `drift_magnitude` added over the last `drift_len` points.

use crate::{Error, Result};
use anomaly_core::TimeSeries;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub struct SensorSimulator {
    len: usize,
    base: f64,
    noise_std: f64,
    drift_len: usize,
    drift_magnitude: f64,
    seed: Option<u64>,
}

impl Default for SensorSimulator {
    fn default() -> Self {
        Self {
            len: 1000,
            base: 25.0,
            noise_std: 0.5,
            drift_len: 300,
            drift_magnitude: 5.0,
            seed: Some(42),
        }
    }
}

impl SensorSimulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(mut self, len: usize) -> Self {
        self.len = len;
        self
    }

    pub fn base(mut self, base: f64) -> Self {
        self.base = base;
        self
    }

    pub fn noise_std(mut self, noise_std: f64) -> Self {
        self.noise_std = noise_std;
        self
    }

    /// Ramp over the last `len` points up to `magnitude`
    pub fn drift(mut self, len: usize, magnitude: f64) -> Self {
        self.drift_len = len;
        self.drift_magnitude = magnitude;
        self
    }

    /// `None` draws the noise from entropy
    pub fn seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    /// Index of the first drifting point
    pub fn drift_start(&self) -> usize {
        self.len - self.drift_len.min(self.len)
    }

    /// Ramp value added at index `i`
    fn ramp(&self, i: usize) -> f64 {
        let start = self.drift_start();
        if i < start || self.drift_len < 2 {
            return 0.0;
        }
        self.drift_magnitude * (i - start) as f64 / (self.drift_len - 1) as f64
    }

    pub fn generate(&self) -> Result<TimeSeries> {
        if self.drift_len > self.len {
            return Err(Error::Core(anomaly_core::Error::InvalidParameter(format!(
                "drift length {} exceeds series length {}",
                self.drift_len, self.len
            ))));
        }
        let noise = Normal::new(0.0, self.noise_std).map_err(|e| {
            Error::Core(anomaly_core::Error::InvalidParameter(format!(
                "noise_std = {}: {e}",
                self.noise_std
            )))
        })?;
        let mut rng = match self.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        let values: Vec<f64> = (0..self.len)
            .map(|i| self.base + noise.sample(&mut rng) + self.ramp(i))
            .collect();
        debug!(
            len = self.len,
            drift_start = self.drift_start(),
            seed = ?self.seed,
            "generated synthetic sensor series"
        );
        Ok(TimeSeries::from_values("sensor", &values))
    }
}
