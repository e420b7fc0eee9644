//! Sequence-reconstruction scorer
//!
//! Scores sliding windows of a series by how badly an LSTM autoencoder,
//! trained on the leading windows of the same series, reconstructs them.
//! Training and scoring are one call; the fitted model never leaves it.
//!
//! Windows are built over the series with gaps dropped, so window `i` belongs
//! to row `i + window_size` of the gap-free series. Scoring covers every
//! window, including those the model was trained on.

use crate::autoencoder::LstmAutoencoder;
use crate::training::{train, TrainingReport, TrainingSchedule};
use anomaly_core::window::sliding_windows;
use anomaly_core::{
    Error, MinMaxScaler, Result, RunBudget, ScorerProperties, TimeSeries, WindowScorer,
    WindowScores,
};
use anomaly_quantile::{PercentileThreshold, DEFAULT_PERCENTILE};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, warn};

/// Default window length
pub const DEFAULT_WINDOW_SIZE: usize = 30;

/// Knobs of the sequence scorer
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceParameters {
    pub window_size: usize,
    /// Leading fraction of windows used for training, in `(0, 1]`
    pub train_fraction: f64,
    pub epochs: usize,
    pub batch_size: usize,
    /// Hidden size of both LSTM layers
    pub latent_dim: usize,
    pub learning_rate: f64,
    /// Percentile of the reconstruction errors used as threshold
    pub percentile: f64,
    /// Seed for initialisation and shuffling; `None` draws from entropy
    pub seed: Option<u64>,
}

impl Default for SequenceParameters {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            train_fraction: 0.6,
            epochs: 10,
            batch_size: 32,
            latent_dim: 32,
            learning_rate: 1e-3,
            percentile: DEFAULT_PERCENTILE,
            seed: None,
        }
    }
}

impl SequenceParameters {
    pub fn validate(&self) -> Result<()> {
        if self.window_size == 0 {
            return Err(Error::InvalidParameter(
                "window_size must be at least 1".to_string(),
            ));
        }
        if !(self.train_fraction > 0.0 && self.train_fraction <= 1.0) {
            return Err(Error::invalid_fraction("train_fraction", self.train_fraction));
        }
        if self.epochs == 0 {
            return Err(Error::InvalidParameter("epochs must be at least 1".to_string()));
        }
        if self.batch_size == 0 {
            return Err(Error::InvalidParameter(
                "batch_size must be at least 1".to_string(),
            ));
        }
        if self.latent_dim == 0 {
            return Err(Error::InvalidParameter(
                "latent_dim must be at least 1".to_string(),
            ));
        }
        if !(self.learning_rate > 0.0 && self.learning_rate.is_finite()) {
            return Err(Error::InvalidParameter(format!(
                "learning_rate = {} must be positive",
                self.learning_rate
            )));
        }
        if !(self.percentile > 0.0 && self.percentile < 100.0) {
            return Err(Error::InvalidParameter(format!(
                "percentile = {} must be in (0, 100)",
                self.percentile
            )));
        }
        Ok(())
    }

    /// Number of leading windows trained on, out of `count`
    pub fn training_windows(&self, count: usize) -> usize {
        ((count as f64 * self.train_fraction).floor() as usize).clamp(1, count.max(1))
    }
}

/// Window scorer backed by an LSTM autoencoder
#[derive(Debug, Clone, Default)]
pub struct SequenceReconstructionScorer {
    params: SequenceParameters,
}

impl SequenceReconstructionScorer {
    pub fn new(params: SequenceParameters) -> Result<Self> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn parameters(&self) -> &SequenceParameters {
        &self.params
    }

    fn rng(&self) -> ChaCha8Rng {
        match self.params.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        }
    }

    /// Train, score every window and report how training went
    pub fn score_with_report(
        &self,
        series: &TimeSeries,
        budget: &RunBudget,
    ) -> Result<(WindowScores, TrainingReport)> {
        let ws = self.params.window_size;
        let clean = series.drop_missing();
        if clean.len() < ws + 1 {
            return Err(Error::insufficient(ws + 1, clean.len()));
        }
        if clean.len() < series.len() {
            warn!(
                series = series.name(),
                dropped = series.len() - clean.len(),
                "dropped missing values before windowing"
            );
        }

        let values = clean.complete_values()?;
        let (scaler, scaled) = MinMaxScaler::fit_transform(&values)?;
        if scaler.max() == scaler.min() {
            warn!(series = series.name(), "constant series, all windows scale to 0");
        }
        let windows = sliding_windows(&scaled, ws)?;
        let train_count = self.params.training_windows(windows.len());

        let mut rng = self.rng();
        let mut model = LstmAutoencoder::new(self.params.latent_dim, &mut rng);
        let schedule = TrainingSchedule {
            epochs: self.params.epochs,
            batch_size: self.params.batch_size,
            learning_rate: self.params.learning_rate,
        };
        let report = train(&mut model, &windows[..train_count], schedule, budget, &mut rng)?;

        budget.check()?;
        let errors: Vec<f64> = windows
            .iter()
            .map(|w| model.reconstruction_error(w))
            .collect();
        if errors.iter().any(|e| !e.is_finite()) {
            return Err(Error::non_finite("reconstruction error"));
        }

        let (threshold, flags) = PercentileThreshold::new(self.params.percentile)?.fit_flag(&errors)?;
        let scores = WindowScores {
            window_size: ws,
            errors,
            flags,
            threshold,
        };
        debug!(
            series = series.name(),
            windows = scores.len(),
            training_windows = train_count,
            threshold,
            anomalies = scores.anomaly_count(),
            elapsed_ms = report.elapsed.as_millis() as u64,
            "sequence scorer finished"
        );
        Ok((scores, report))
    }
}

impl ScorerProperties for SequenceReconstructionScorer {
    fn algorithm_name(&self) -> &'static str {
        "LstmAutoencoder"
    }

    fn minimum_sample_size(&self) -> usize {
        self.params.window_size + 1
    }
}

impl WindowScorer for SequenceReconstructionScorer {
    fn window_size(&self) -> usize {
        self.params.window_size
    }

    fn score_windows(&self, series: &TimeSeries, budget: &RunBudget) -> Result<WindowScores> {
        self.score_with_report(series, budget).map(|(scores, _)| scores)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small(window_size: usize) -> SequenceReconstructionScorer {
        SequenceReconstructionScorer::new(SequenceParameters {
            window_size,
            epochs: 2,
            batch_size: 16,
            latent_dim: 4,
            seed: Some(42),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_defaults() {
        let params = SequenceParameters::default();
        assert_eq!(params.window_size, 30);
        assert_eq!(params.train_fraction, 0.6);
        assert_eq!(params.epochs, 10);
        assert_eq!(params.batch_size, 32);
        assert_eq!(params.percentile, 95.0);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_training_window_count() {
        let params = SequenceParameters::default();
        assert_eq!(params.training_windows(970), 582);
        assert_eq!(params.training_windows(1), 1);
        assert_eq!(params.training_windows(0), 0);
    }

    #[test]
    fn test_invalid_parameters() {
        let bad = [
            SequenceParameters { window_size: 0, ..Default::default() },
            SequenceParameters { train_fraction: 0.0, ..Default::default() },
            SequenceParameters { train_fraction: 1.2, ..Default::default() },
            SequenceParameters { epochs: 0, ..Default::default() },
            SequenceParameters { batch_size: 0, ..Default::default() },
            SequenceParameters { percentile: 100.0, ..Default::default() },
        ];
        for params in bad {
            assert!(matches!(
                SequenceReconstructionScorer::new(params),
                Err(Error::InvalidParameter(_))
            ));
        }
    }

    #[test]
    fn test_exactly_window_size_points_is_insufficient() {
        let series = TimeSeries::from_values("sensor", &[1.0; 10]);
        let result = small(10).score_windows(&series, &RunBudget::unlimited());
        assert!(matches!(
            result,
            Err(Error::InsufficientData { expected: 11, actual: 10 })
        ));
    }

    #[test]
    fn test_gaps_count_against_minimum() {
        let mut values = vec![1.0; 11];
        values[3] = f64::NAN;
        let series = TimeSeries::from_values("sensor", &values);
        assert!(matches!(
            small(10).score_windows(&series, &RunBudget::unlimited()),
            Err(Error::InsufficientData { expected: 11, actual: 10 })
        ));
    }

    #[test]
    fn test_one_window_for_window_size_plus_one() {
        let values: Vec<f64> = (0..11).map(|i| i as f64).collect();
        let series = TimeSeries::from_values("sensor", &values);
        let scores = small(10).score_windows(&series, &RunBudget::unlimited()).unwrap();
        assert_eq!(scores.len(), 1);
        assert!(!scores.flags[0]);
    }

    #[test]
    fn test_seeded_runs_are_identical() {
        let values: Vec<f64> = (0..60).map(|i| (i as f64 * 0.3).sin()).collect();
        let series = TimeSeries::from_values("sensor", &values);
        let scorer = small(8);
        let a = scorer.score_windows(&series, &RunBudget::unlimited()).unwrap();
        let b = scorer.score_windows(&series, &RunBudget::unlimited()).unwrap();
        assert_eq!(a, b);
    }
}
