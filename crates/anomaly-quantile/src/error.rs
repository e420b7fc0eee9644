//! Error types for percentile estimation

use thiserror::Error;

/// Errors that can occur during percentile estimation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Empty data provided
    #[error("Cannot compute quantile of empty data")]
    EmptyData,

    /// Invalid quantile probability
    #[error("Quantile probability {p} must be in [0, 1]")]
    InvalidProbability { p: f64 },

    /// Invalid percentile for a threshold
    #[error("Threshold percentile {percentile} must be in (0, 100)")]
    InvalidPercentile { percentile: f64 },

    /// Data containing NaN or infinite values
    #[error("Quantile input contains NaN or infinite values")]
    NonFinite,
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

// Helper functions
impl Error {
    /// Check if probability is valid
    pub fn check_probability(p: f64) -> Result<()> {
        if !(0.0..=1.0).contains(&p) {
            return Err(Error::InvalidProbability { p });
        }
        Ok(())
    }

    /// Check if data is non-empty
    pub fn check_non_empty<T>(data: &[T]) -> Result<()> {
        if data.is_empty() {
            return Err(Error::EmptyData);
        }
        Ok(())
    }
}

impl From<Error> for anomaly_core::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::EmptyData => anomaly_core::Error::empty_input(),
            Error::InvalidProbability { .. } | Error::InvalidPercentile { .. } => {
                anomaly_core::Error::InvalidParameter(err.to_string())
            }
            Error::NonFinite => anomaly_core::Error::non_finite("quantile input"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checks() {
        assert!(Error::check_probability(0.95).is_ok());
        assert_eq!(
            Error::check_probability(1.5),
            Err(Error::InvalidProbability { p: 1.5 })
        );
        assert_eq!(Error::check_non_empty::<f64>(&[]), Err(Error::EmptyData));
    }

    #[test]
    fn test_into_core_error() {
        let core: anomaly_core::Error = Error::EmptyData.into();
        assert!(matches!(
            core,
            anomaly_core::Error::InsufficientData { expected: 1, actual: 0 }
        ));

        let core: anomaly_core::Error = Error::InvalidPercentile { percentile: 120.0 }.into();
        assert!(matches!(core, anomaly_core::Error::InvalidParameter(_)));
    }
}
