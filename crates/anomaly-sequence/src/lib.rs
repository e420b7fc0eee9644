//! Sequence-reconstruction anomaly scoring
//!
//! An LSTM autoencoder is trained on the leading sliding windows of a
//! min-max normalised series and then reconstructs every window. Windows
//! whose reconstruction error exceeds a percentile of all errors of the run
//! (95th by default) are anomalous.
//!
//! Training honours a [`RunBudget`](anomaly_core::RunBudget): cancelling its
//! token or exceeding its time limit stops the run between mini-batches.
//!
//! # Example
//!
//! ```rust
//! use anomaly_core::{RunBudget, TimeSeries, WindowScorer};
//! use anomaly_sequence::{SequenceParameters, SequenceReconstructionScorer};
//!
//! let values: Vec<f64> = (0..80).map(|i| (i as f64 * 0.2).sin()).collect();
//! let series = TimeSeries::from_values("sensor", &values);
//!
//! let scorer = SequenceReconstructionScorer::new(SequenceParameters {
//!     window_size: 10,
//!     epochs: 2,
//!     latent_dim: 4,
//!     seed: Some(7),
//!     ..Default::default()
//! })
//! .unwrap();
//! let scores = scorer.score_windows(&series, &RunBudget::unlimited()).unwrap();
//! assert_eq!(scores.len(), 70);
//! ```

pub mod autoencoder;
pub mod lstm;
pub mod optimizer;
pub mod scorer;
pub mod training;

pub use autoencoder::LstmAutoencoder;
pub use optimizer::Adam;
pub use scorer::{SequenceParameters, SequenceReconstructionScorer, DEFAULT_WINDOW_SIZE};
pub use training::TrainingReport;
