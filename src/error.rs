//! Error types for the market pulse analytics

use thiserror::Error;

/// Result type alias for this crate
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the library
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed record: non-finite value, bad ordering, impossible price
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Not enough records for a well-defined statistic
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// Detector parameters out of range
    #[error("Invalid configuration: {0}")]
    ConfigurationError(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV read/write error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
