//! # telemetry-anomaly
//!
//! Anomaly scoring for one-dimensional sensor and motorsport telemetry
//! series.
//!
//! ## Crates
//!
//! - [`anomaly_core`]: series types, scorer traits, errors, cancellation
//! - [`anomaly_quantile`]: percentile thresholds
//! - [`anomaly_outlier`]: isolation forest and one-class SVM point scorers
//! - [`anomaly_sequence`]: LSTM autoencoder window scorer
//! - [`anomaly_telemetry`]: sessions, session stores, CSV, simulation, replay
//!
//! This crate ties them together in a [`ScoringPipeline`] driven by a
//! [`PipelineConfig`].
//!
//! ## Example
//!
//! ```rust
//! use telemetry_anomaly::prelude::*;
//!
//! let series = SensorSimulator::new().len(300).drift(90, 5.0).generate().unwrap();
//! let config = PipelineConfig::point_only().with_seed(42);
//! let report = ScoringPipeline::new(config).unwrap().run(&series).unwrap();
//!
//! assert_eq!(report.annotated.len(), 300);
//! let flagged = report.isolation.unwrap().anomalies;
//! assert!((12..=16).contains(&flagged));
//! ```

pub mod config;
pub mod error;
pub mod pipeline;

pub use anomaly_core;
pub use anomaly_outlier;
pub use anomaly_quantile;
pub use anomaly_sequence;
pub use anomaly_telemetry;

pub use config::{IsolationConfig, PipelineConfig, SequenceConfig, SvmConfig};
pub use error::{Error, Result};
pub use pipeline::{PipelineReport, ScoringPipeline, StageSummary};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{PipelineConfig, PipelineReport, ScoringPipeline};
    pub use anomaly_core::prelude::*;
    pub use anomaly_outlier::{IsolationForestScorer, OneClassSvmScorer};
    pub use anomaly_sequence::SequenceReconstructionScorer;
    pub use anomaly_telemetry::{
        read_sensor_csv, write_annotated_csv_path, ReplayStream, SensorSimulator,
    };
}
