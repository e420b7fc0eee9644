//! Time series of a single named measurement

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// One timestamped measurement; `value` is `None` for a gap
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub time: f64,
    pub value: Option<f64>,
}

impl Sample {
    pub fn new(time: f64, value: f64) -> Self {
        Self {
            time,
            value: Some(value),
        }
    }

    pub fn missing(time: f64) -> Self {
        Self { time, value: None }
    }
}

/// Ordered sequence of samples of one measurement
///
/// Insertion order is time order: timestamps are non-decreasing. Values may
/// contain gaps, which scorers either drop or reject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    name: String,
    samples: Vec<Sample>,
}

impl TimeSeries {
    /// Create a series, validating timestamp order
    pub fn new(name: impl Into<String>, samples: Vec<Sample>) -> Result<Self> {
        if let Some(pos) = samples.iter().position(|s| !s.time.is_finite()) {
            return Err(Error::InvalidInput(format!(
                "timestamp at row {pos} is not finite"
            )));
        }
        if let Some(pos) = samples.windows(2).position(|w| w[1].time < w[0].time) {
            return Err(Error::InvalidInput(format!(
                "timestamps decrease at row {}: {} after {}",
                pos + 1,
                samples[pos + 1].time,
                samples[pos].time
            )));
        }
        let samples = samples
            .into_iter()
            .map(|s| Sample {
                time: s.time,
                value: s.value.filter(|v| v.is_finite()),
            })
            .collect();
        Ok(Self {
            name: name.into(),
            samples,
        })
    }

    /// Create a gap-free series with timestamps `0, 1, 2, ...`
    pub fn from_values(name: impl Into<String>, values: &[f64]) -> Self {
        Self {
            name: name.into(),
            samples: values
                .iter()
                .enumerate()
                .map(|(i, &v)| Sample {
                    time: i as f64,
                    value: Some(v).filter(|v| v.is_finite()),
                })
                .collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn times(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().map(|s| s.time)
    }

    pub fn values(&self) -> impl Iterator<Item = Option<f64>> + '_ {
        self.samples.iter().map(|s| s.value)
    }

    /// Number of gaps in the series
    pub fn missing_count(&self) -> usize {
        self.samples.iter().filter(|s| s.value.is_none()).count()
    }

    /// Copy of the series with gap rows removed
    pub fn drop_missing(&self) -> TimeSeries {
        Self {
            name: self.name.clone(),
            samples: self
                .samples
                .iter()
                .copied()
                .filter(|s| s.value.is_some())
                .collect(),
        }
    }

    /// All values, failing if the series has any gap
    pub fn complete_values(&self) -> Result<Vec<f64>> {
        let missing = self.missing_count();
        if missing > 0 {
            return Err(Error::MissingValues { count: missing });
        }
        Ok(self.samples.iter().filter_map(|s| s.value).collect())
    }

    /// The first `n` samples (or the whole series if shorter)
    pub fn prefix(&self, n: usize) -> TimeSeries {
        Self {
            name: self.name.clone(),
            samples: self.samples[..n.min(self.samples.len())].to_vec(),
        }
    }

    /// Rename the measurement
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_decreasing_timestamps() {
        let samples = vec![Sample::new(0.0, 1.0), Sample::new(2.0, 1.0), Sample::new(1.0, 1.0)];
        let err = TimeSeries::new("sensor", samples).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert!(err.to_string().contains("row 2"));
    }

    #[test]
    fn test_equal_timestamps_allowed() {
        let samples = vec![Sample::new(0.0, 1.0), Sample::new(0.0, 2.0)];
        assert!(TimeSeries::new("sensor", samples).is_ok());
    }

    #[test]
    fn test_non_finite_values_become_gaps() {
        let series = TimeSeries::from_values("sensor", &[1.0, f64::NAN, 3.0, f64::INFINITY]);
        assert_eq!(series.len(), 4);
        assert_eq!(series.missing_count(), 2);
    }

    #[test]
    fn test_drop_missing_keeps_order() {
        let samples = vec![
            Sample::new(0.0, 1.0),
            Sample::missing(1.0),
            Sample::new(2.0, 3.0),
        ];
        let series = TimeSeries::new("speed", samples).unwrap();
        let clean = series.drop_missing();
        assert_eq!(clean.len(), 2);
        assert_eq!(clean.times().collect::<Vec<_>>(), vec![0.0, 2.0]);
        assert_eq!(clean.complete_values().unwrap(), vec![1.0, 3.0]);
        assert_eq!(clean.name(), "speed");
    }

    #[test]
    fn test_complete_values_reports_gaps() {
        let samples = vec![Sample::new(0.0, 1.0), Sample::missing(1.0)];
        let series = TimeSeries::new("speed", samples).unwrap();
        match series.complete_values() {
            Err(Error::MissingValues { count }) => assert_eq!(count, 1),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_prefix() {
        let series = TimeSeries::from_values("sensor", &[1.0, 2.0, 3.0]);
        assert_eq!(series.prefix(2).len(), 2);
        assert_eq!(series.prefix(10).len(), 3);
        assert!(series.prefix(0).is_empty());
    }
}
