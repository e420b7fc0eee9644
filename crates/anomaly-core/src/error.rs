//! Error types for anomaly scoring
//!
//! Provides a unified error type for all anomaly crates. Every error is local
//! to a single run; nothing in the workspace retries automatically.

use std::time::Duration;
use thiserror::Error;

/// Core error type for anomaly scoring operations
#[derive(Error, Debug)]
pub enum Error {
    /// The requested data source could not be reached or has no such data
    #[error("Data unavailable: {0}")]
    DataUnavailable(String),

    /// Insufficient data for the requested operation
    #[error("Insufficient data: expected at least {expected} samples, got {actual}")]
    InsufficientData { expected: usize, actual: usize },

    /// The selected field is missing or has no numeric content
    #[error("Invalid selection: {0}")]
    InvalidSelection(String),

    /// Invalid parameter provided to a function
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Invalid input data
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The series still contains gaps where a gap-free series is required
    #[error("Missing values: series contains {count} missing measurements")]
    MissingValues { count: usize },

    /// Numerical computation error
    #[error("Computation error: {0}")]
    Computation(String),

    /// The run was cancelled through its cancellation token
    #[error("Run cancelled")]
    Cancelled,

    /// The run exceeded its wall-clock limit
    #[error("Run timed out after {limit:?}")]
    TimedOut { limit: Duration },

    /// IO error (for file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Other errors
    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of errors as reported to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Source lookup failed (bad identifiers, network or disk failure)
    DataUnavailable,
    /// Too few rows for the requested operation
    InsufficientData,
    /// Missing or entirely non-numeric field
    InvalidSelection,
    /// Bad parameters or malformed input
    InvalidRequest,
    /// Cancelled or timed out
    Interrupted,
    /// Anything else
    Internal,
}

impl Error {
    /// Create an error for empty input
    pub fn empty_input() -> Self {
        Self::InsufficientData {
            expected: 1,
            actual: 0,
        }
    }

    /// Create an error for a required minimum sample count
    pub fn insufficient(expected: usize, actual: usize) -> Self {
        Self::InsufficientData { expected, actual }
    }

    /// Create an error for a fraction parameter outside its range
    pub fn invalid_fraction(name: &str, value: f64) -> Self {
        Self::InvalidParameter(format!("{name} = {value} must be in (0, 1]"))
    }

    /// Create an error for size mismatch
    pub fn size_mismatch(expected: usize, actual: usize, context: &str) -> Self {
        Self::InvalidInput(format!(
            "Size mismatch in {context}: expected {expected}, got {actual}"
        ))
    }

    /// Create an error for NaN/Inf values
    pub fn non_finite(context: &str) -> Self {
        Self::Computation(format!("{context} contains NaN or infinite values"))
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::DataUnavailable(_) | Self::Io(_) => ErrorKind::DataUnavailable,
            Self::InsufficientData { .. } => ErrorKind::InsufficientData,
            Self::InvalidSelection(_) => ErrorKind::InvalidSelection,
            Self::InvalidParameter(_) | Self::InvalidInput(_) | Self::MissingValues { .. } => {
                ErrorKind::InvalidRequest
            }
            Self::Cancelled | Self::TimedOut { .. } => ErrorKind::Interrupted,
            Self::Computation(_) | Self::Other(_) => ErrorKind::Internal,
        }
    }

    /// Whether the caller can reasonably try again with different input
    pub fn is_recoverable(&self) -> bool {
        self.kind() != ErrorKind::Internal
    }
}
