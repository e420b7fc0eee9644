//! Series annotated with derived anomaly columns
//!
//! An [`AnnotatedSeries`] starts as a copy of a gap-free [`TimeSeries`] and
//! accumulates derived columns as scorers run over it. The sequence scorer
//! shortens the series because its first rows have no preceding window, so
//! the number of rows never exceeds the length of the source series.

use crate::rolling::RollingFeatures;
use crate::traits::{PointScores, WindowScores};
use crate::{Error, Result, TimeSeries};
use serde::{Deserialize, Serialize};

/// One row of an annotated series
///
/// Flags serialise as `0`/`1`; absent columns serialise as empty cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedRow {
    pub time: f64,
    pub value: f64,
    pub rolling_mean: Option<f64>,
    pub rolling_std: Option<f64>,
    #[serde(with = "flag")]
    pub anomaly: Option<bool>,
    pub anomaly_score: Option<f64>,
    #[serde(with = "flag")]
    pub anomaly_svm: Option<bool>,
    pub reconstruction_error: Option<f64>,
    #[serde(with = "flag")]
    pub anomaly_lstm: Option<bool>,
}

impl AnnotatedRow {
    pub fn new(time: f64, value: f64) -> Self {
        Self {
            time,
            value,
            rolling_mean: None,
            rolling_std: None,
            anomaly: None,
            anomaly_score: None,
            anomaly_svm: None,
            reconstruction_error: None,
            anomaly_lstm: None,
        }
    }

    /// Read a flag column of this row
    pub fn flag(&self, column: FlagColumn) -> Option<bool> {
        match column {
            FlagColumn::Isolation => self.anomaly,
            FlagColumn::Svm => self.anomaly_svm,
            FlagColumn::Lstm => self.anomaly_lstm,
        }
    }
}

/// The boolean anomaly columns an annotated series can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagColumn {
    /// `anomaly`, set by the isolation forest scorer
    Isolation,
    /// `anomaly_svm`, set by the one-class SVM scorer
    Svm,
    /// `anomaly_lstm`, set by the sequence-reconstruction scorer
    Lstm,
}

/// A measurement series together with its derived anomaly columns
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedSeries {
    name: String,
    rows: Vec<AnnotatedRow>,
    iso_threshold: Option<f64>,
    lstm_threshold: Option<f64>,
}

impl AnnotatedSeries {
    /// Start annotating a gap-free series
    pub fn from_series(series: &TimeSeries) -> Result<Self> {
        let values = series.complete_values()?;
        let rows = series
            .times()
            .zip(values)
            .map(|(t, v)| AnnotatedRow::new(t, v))
            .collect();
        Ok(Self {
            name: series.name().to_string(),
            rows,
            iso_threshold: None,
            lstm_threshold: None,
        })
    }

    /// Rebuild from rows, e.g. after reading a CSV file back
    pub fn from_rows(name: impl Into<String>, rows: Vec<AnnotatedRow>) -> Self {
        Self {
            name: name.into(),
            rows,
            iso_threshold: None,
            lstm_threshold: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rows(&self) -> &[AnnotatedRow] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<AnnotatedRow> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Offset separating isolation-forest inliers from outliers in this run
    pub fn iso_threshold(&self) -> Option<f64> {
        self.iso_threshold
    }

    /// Reconstruction-error threshold of this run
    pub fn lstm_threshold(&self) -> Option<f64> {
        self.lstm_threshold
    }

    /// Attach rolling mean and standard deviation
    pub fn apply_rolling(&mut self, features: &RollingFeatures) -> Result<()> {
        self.check_len(features.mean.len(), "rolling features")?;
        for ((row, &m), &s) in self.rows.iter_mut().zip(&features.mean).zip(&features.std) {
            row.rolling_mean = Some(m);
            row.rolling_std = Some(s);
        }
        Ok(())
    }

    /// Attach isolation forest scores and labels, one per row
    pub fn apply_isolation(&mut self, scores: &PointScores) -> Result<()> {
        self.check_len(scores.flags.len(), "isolation labels")?;
        for ((row, &flag), &score) in self.rows.iter_mut().zip(&scores.flags).zip(&scores.scores) {
            row.anomaly = Some(flag);
            row.anomaly_score = Some(score);
        }
        self.iso_threshold = Some(scores.threshold);
        Ok(())
    }

    /// Attach one-class SVM labels, one per row
    pub fn apply_svm(&mut self, scores: &PointScores) -> Result<()> {
        self.check_len(scores.flags.len(), "svm labels")?;
        for (row, &flag) in self.rows.iter_mut().zip(&scores.flags) {
            row.anomaly_svm = Some(flag);
        }
        Ok(())
    }

    /// Attach per-window reconstruction errors
    ///
    /// Window `i` spans rows `i..i + window_size` and is reported on row
    /// `i + window_size`; the first `window_size` rows have no window and
    /// are dropped.
    pub fn apply_window_scores(&mut self, scores: &WindowScores) -> Result<()> {
        let ws = scores.window_size;
        if self.rows.len() <= ws {
            return Err(Error::insufficient(ws + 1, self.rows.len()));
        }
        let expected = self.rows.len() - ws;
        if scores.errors.len() != expected || scores.flags.len() != expected {
            return Err(Error::size_mismatch(
                expected,
                scores.errors.len(),
                "reconstruction errors",
            ));
        }
        self.rows.drain(..ws);
        for ((row, &err), &flag) in self.rows.iter_mut().zip(&scores.errors).zip(&scores.flags) {
            row.reconstruction_error = Some(err);
            row.anomaly_lstm = Some(flag);
        }
        self.lstm_threshold = Some(scores.threshold);
        Ok(())
    }

    /// Rows whose given flag column is set
    pub fn flagged(&self, column: FlagColumn) -> impl Iterator<Item = &AnnotatedRow> + '_ {
        self.rows
            .iter()
            .filter(move |row| row.flag(column) == Some(true))
    }

    /// Number of rows whose given flag column is set
    pub fn anomaly_count(&self, column: FlagColumn) -> usize {
        self.flagged(column).count()
    }

    fn check_len(&self, actual: usize, context: &str) -> Result<()> {
        if actual != self.rows.len() {
            return Err(Error::size_mismatch(self.rows.len(), actual, context));
        }
        Ok(())
    }
}

/// Serialise `Option<bool>` as an optional `0`/`1` integer
mod flag {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<bool>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(flag) => serializer.serialize_some(&u8::from(*flag)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<bool>, D::Error> {
        let raw = Option::<u8>::deserialize(deserializer)?;
        match raw {
            None => Ok(None),
            Some(0) => Ok(Some(false)),
            Some(1) => Ok(Some(true)),
            Some(other) => Err(serde::de::Error::custom(format!(
                "anomaly flag must be 0 or 1, got {other}"
            ))),
        }
    }
}
