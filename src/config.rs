//! Pipeline configuration
//!
//! Every knob of a scoring run, collected in one serde-serialisable value.
//! `None` for a stage disables it. Defaults reproduce the constants of the
//! individual scorers.

use crate::{Error, Result};
use anomaly_core::DEFAULT_ROLLING_WINDOW;
use anomaly_outlier::{Gamma, IsolationForestParameters, OneClassSvmParameters};
use anomaly_sequence::SequenceParameters;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;

/// Isolation forest stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IsolationConfig {
    pub contamination: f64,
    pub n_trees: usize,
    pub max_samples: usize,
    pub seed: Option<u64>,
}

impl Default for IsolationConfig {
    fn default() -> Self {
        let params = IsolationForestParameters::default();
        Self {
            contamination: params.contamination,
            n_trees: params.n_trees,
            max_samples: params.max_samples,
            seed: params.seed,
        }
    }
}

impl From<&IsolationConfig> for IsolationForestParameters {
    fn from(config: &IsolationConfig) -> Self {
        Self {
            n_trees: config.n_trees,
            max_samples: config.max_samples,
            contamination: config.contamination,
            seed: config.seed,
        }
    }
}

/// One-class SVM stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SvmConfig {
    pub nu: f64,
    /// Fixed RBF width; `None` scales it to the variance of the series
    pub gamma: Option<f64>,
    pub tolerance: f64,
    pub max_iterations: usize,
    pub max_samples: usize,
}

impl Default for SvmConfig {
    fn default() -> Self {
        let params = OneClassSvmParameters::default();
        Self {
            nu: params.nu,
            gamma: None,
            tolerance: params.tolerance,
            max_iterations: params.max_iterations,
            max_samples: params.max_samples,
        }
    }
}

impl From<&SvmConfig> for OneClassSvmParameters {
    fn from(config: &SvmConfig) -> Self {
        Self {
            nu: config.nu,
            gamma: config.gamma.map_or(Gamma::Scale, Gamma::Value),
            tolerance: config.tolerance,
            max_iterations: config.max_iterations,
            max_samples: config.max_samples,
        }
    }
}

/// Sequence-reconstruction stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequenceConfig {
    pub window_size: usize,
    pub train_fraction: f64,
    pub epochs: usize,
    pub batch_size: usize,
    pub latent_dim: usize,
    pub learning_rate: f64,
    pub percentile: f64,
    pub seed: Option<u64>,
    /// Wall-clock limit on training, in seconds
    pub time_limit_secs: Option<f64>,
}

impl Default for SequenceConfig {
    fn default() -> Self {
        let params = SequenceParameters::default();
        Self {
            window_size: params.window_size,
            train_fraction: params.train_fraction,
            epochs: params.epochs,
            batch_size: params.batch_size,
            latent_dim: params.latent_dim,
            learning_rate: params.learning_rate,
            percentile: params.percentile,
            seed: params.seed,
            time_limit_secs: None,
        }
    }
}

impl SequenceConfig {
    pub fn time_limit(&self) -> Result<Option<Duration>> {
        self.time_limit_secs
            .map(|secs| {
                Duration::try_from_secs_f64(secs).map_err(|_| {
                    Error::Config(format!("time_limit_secs = {secs} is not a valid duration"))
                })
            })
            .transpose()
    }
}

impl From<&SequenceConfig> for SequenceParameters {
    fn from(config: &SequenceConfig) -> Self {
        Self {
            window_size: config.window_size,
            train_fraction: config.train_fraction,
            epochs: config.epochs,
            batch_size: config.batch_size,
            latent_dim: config.latent_dim,
            learning_rate: config.learning_rate,
            percentile: config.percentile,
            seed: config.seed,
        }
    }
}

/// Configuration of a whole scoring run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub rolling_window: Option<usize>,
    pub isolation: Option<IsolationConfig>,
    pub svm: Option<SvmConfig>,
    pub sequence: Option<SequenceConfig>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            rolling_window: Some(DEFAULT_ROLLING_WINDOW),
            isolation: Some(IsolationConfig::default()),
            svm: Some(SvmConfig::default()),
            sequence: Some(SequenceConfig::default()),
        }
    }
}

impl PipelineConfig {
    /// Only the point scorers, as the batch sensor check runs them
    pub fn point_only() -> Self {
        Self {
            sequence: None,
            ..Self::default()
        }
    }

    /// Load a JSON configuration; missing fields take their defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            Error::Config(format!("cannot open {}: {e}", path.display()))
        })?;
        serde_json::from_reader(BufReader::new(file))
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))
    }

    /// Seed every randomised stage with the same value
    pub fn with_seed(mut self, seed: u64) -> Self {
        if let Some(isolation) = self.isolation.as_mut() {
            isolation.seed = Some(seed);
        }
        if let Some(sequence) = self.sequence.as_mut() {
            sequence.seed = Some(seed);
        }
        self
    }

    /// Check every enabled stage
    pub fn validate(&self) -> Result<()> {
        if self.rolling_window == Some(0) {
            return Err(Error::Config("rolling_window must be at least 1".to_string()));
        }
        if let Some(isolation) = &self.isolation {
            IsolationForestParameters::from(isolation).validate()?;
        }
        if let Some(svm) = &self.svm {
            OneClassSvmParameters::from(svm).validate()?;
        }
        if let Some(sequence) = &self.sequence {
            SequenceParameters::from(sequence).validate()?;
            sequence.time_limit()?;
        }
        Ok(())
    }
}
