//! Telemetry error types.

use thiserror::Error;

/// Errors that can occur setting up telemetry.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The configured filter directive could not be parsed.
    #[error("configuration error: {0}")]
    Config(String),

    /// The global subscriber could not be installed (most likely one was
    /// already installed).
    #[error("initialization error: {0}")]
    Init(String),
}

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
