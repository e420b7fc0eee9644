//! Point-wise outlier scorers
//!
//! Both scorers treat every value of a series as an independent
//! one-dimensional observation:
//!
//! - [`IsolationForestScorer`]: isolation forest, labels the `contamination`
//!   fraction of points with the highest anomaly scores. Deterministic only
//!   with a pinned seed.
//! - [`OneClassSvmScorer`]: one-class SVM with an RBF kernel, labels points
//!   outside the learned boundary. Deterministic.
//!
//! # Example
//!
//! ```rust
//! use anomaly_core::{PointScorer, TimeSeries};
//! use anomaly_outlier::IsolationForestScorer;
//!
//! let mut values: Vec<f64> = (0..100).map(|i| 25.0 + (i % 7) as f64 * 0.1).collect();
//! values[50] = 40.0;
//! let series = TimeSeries::from_values("sensor", &values);
//!
//! let scorer = IsolationForestScorer::with_contamination(0.05, Some(42)).unwrap();
//! let result = scorer.score_points(&series).unwrap();
//! assert!(result.flags[50]);
//! ```

pub mod isolation_forest;
pub mod kernel;
pub mod one_class_svm;

pub use isolation_forest::{IsolationForestParameters, IsolationForestScorer};
pub use kernel::{Gamma, RbfKernel};
pub use one_class_svm::{OneClassSvmParameters, OneClassSvmScorer};
