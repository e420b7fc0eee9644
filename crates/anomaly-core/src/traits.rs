//! Core traits for anomaly scorers
//!
//! Scorers are stateless between calls: every call fits a fresh model on the
//! series it is given and returns scores for that same series. No fitted
//! model is ever handed back to the caller.

use crate::cancel::RunBudget;
use crate::{Result, TimeSeries};

/// Properties of a scorer that don't depend on the input
pub trait ScorerProperties {
    /// Get the name of the scoring algorithm
    fn algorithm_name(&self) -> &'static str;

    /// Get the minimum number of clean samples required for scoring
    fn minimum_sample_size(&self) -> usize;
}

/// Per-point scores for a whole series
#[derive(Debug, Clone, PartialEq)]
pub struct PointScores {
    /// Anomaly score per point, higher is more anomalous
    pub scores: Vec<f64>,
    /// Anomaly label per point
    pub flags: Vec<bool>,
    /// Score above which a point is labelled anomalous
    pub threshold: f64,
}

impl PointScores {
    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    /// Number of points labelled anomalous
    pub fn anomaly_count(&self) -> usize {
        self.flags.iter().filter(|&&f| f).count()
    }

    /// Fraction of points labelled anomalous, in `[0, 1]`
    pub fn anomaly_fraction(&self) -> f64 {
        if self.flags.is_empty() {
            return 0.0;
        }
        self.anomaly_count() as f64 / self.flags.len() as f64
    }
}

/// Per-window scores for a whole series
///
/// `errors[i]` belongs to the window starting at sample `i`.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowScores {
    pub window_size: usize,
    pub errors: Vec<f64>,
    pub flags: Vec<bool>,
    pub threshold: f64,
}

impl WindowScores {
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn anomaly_count(&self) -> usize {
        self.flags.iter().filter(|&&f| f).count()
    }

    pub fn anomaly_fraction(&self) -> f64 {
        if self.flags.is_empty() {
            return 0.0;
        }
        self.anomaly_count() as f64 / self.flags.len() as f64
    }
}

/// Scorer labelling individual points without temporal context
pub trait PointScorer: ScorerProperties {
    /// Fit on the series and label every point of it
    fn score_points(&self, series: &TimeSeries) -> Result<PointScores>;
}

/// Scorer labelling sliding windows of a series
pub trait WindowScorer: ScorerProperties {
    /// Length of each window
    fn window_size(&self) -> usize;

    /// Fit on the series and score every window of it
    ///
    /// Long-running fits must check `budget` and stop with
    /// `Error::Cancelled` or `Error::TimedOut`.
    fn score_windows(&self, series: &TimeSeries, budget: &RunBudget) -> Result<WindowScores>;
}
