//! Core traits and types for telemetry anomaly scoring
//!
//! This crate provides the shared data model and contracts used by the
//! scorer crates:
//!
//! - [`TimeSeries`]: an ordered, possibly gappy series of one measurement
//! - [`AnnotatedSeries`]: a gap-free series plus derived anomaly columns
//! - [`PointScorer`] / [`WindowScorer`]: stateless fit-then-score contracts
//! - [`RunBudget`] / [`CancellationToken`]: cancellation and time limits
//!
//! # Example
//!
//! ```rust
//! use anomaly_core::{AnnotatedSeries, TimeSeries, window::sliding_windows};
//!
//! let series = TimeSeries::from_values("sensor", &[25.0, 25.2, 24.9, 25.1, 30.0]);
//! let values = series.complete_values().unwrap();
//! let windows = sliding_windows(&values, 2).unwrap();
//! assert_eq!(windows.len(), 3);
//!
//! let annotated = AnnotatedSeries::from_series(&series).unwrap();
//! assert_eq!(annotated.len(), 5);
//! ```

pub mod annotated;
pub mod cancel;
pub mod error;
pub mod rolling;
pub mod scaling;
pub mod series;
pub mod traits;
pub mod utils;
pub mod window;

// Re-export core types
pub use annotated::{AnnotatedRow, AnnotatedSeries, FlagColumn};
pub use cancel::{CancellationToken, RunBudget};
pub use error::{Error, ErrorKind, Result};
pub use rolling::{RollingFeatures, DEFAULT_ROLLING_WINDOW};
pub use scaling::MinMaxScaler;
pub use series::{Sample, TimeSeries};
pub use traits::{PointScorer, PointScores, ScorerProperties, WindowScorer, WindowScores};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        AnnotatedSeries, CancellationToken, Error, FlagColumn, PointScorer, Result, RunBudget,
        ScorerProperties, TimeSeries, WindowScorer,
    };
}
