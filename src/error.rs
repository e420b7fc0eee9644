//! Error types for telemetry-anomaly

use anomaly_core::ErrorKind;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] anomaly_core::Error),

    #[error(transparent)]
    Telemetry(#[from] anomaly_telemetry::Error),

    /// Unreadable or inconsistent pipeline configuration
    #[error("Invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Core(e) => e.kind(),
            Self::Telemetry(e) => e.kind(),
            Self::Config(_) => ErrorKind::InvalidRequest,
        }
    }

    pub fn is_interrupted(&self) -> bool {
        self.kind() == ErrorKind::Interrupted
    }
}
