//! Error types for anomaly-telemetry

use anomaly_core::ErrorKind;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] anomaly_core::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A session store already holds an entry for this key
    #[error("Store conflict: {0} is already stored")]
    StoreConflict(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn data_unavailable(message: impl Into<String>) -> Self {
        Self::Core(anomaly_core::Error::DataUnavailable(message.into()))
    }

    pub fn invalid_selection(message: impl Into<String>) -> Self {
        Self::Core(anomaly_core::Error::InvalidSelection(message.into()))
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::Core(anomaly_core::Error::InvalidInput(message.into()))
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Core(e) => e.kind(),
            Self::Csv(e) if e.is_io_error() => ErrorKind::DataUnavailable,
            Self::Json(e) if e.is_io() => ErrorKind::DataUnavailable,
            Self::Csv(_) | Self::Json(_) => ErrorKind::InvalidRequest,
            Self::Io(_) => ErrorKind::DataUnavailable,
            Self::StoreConflict(_) => ErrorKind::InvalidRequest,
        }
    }

    pub fn is_data_unavailable(&self) -> bool {
        matches!(self, Self::Core(anomaly_core::Error::DataUnavailable(_)))
    }
}
