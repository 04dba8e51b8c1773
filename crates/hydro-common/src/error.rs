//! Error types for the datastream services.

use thiserror::Error;

/// Result type alias using DataStreamError.
pub type DataStreamResult<T> = Result<T, DataStreamError>;

/// Primary error type for conversion operations.
///
/// All of these are hard failures: nothing is retried and a failing
/// invocation produces no output. Per-row gage pairs that fail to parse
/// are a designed skip, not an error, and never surface here.
#[derive(Debug, Error)]
pub enum DataStreamError {
    // === Configuration ===
    #[error("Missing or empty configuration value: {0}")]
    Configuration(String),

    // === Source resolution ===
    #[error("Unsupported source scheme: {0}")]
    UnsupportedSource(String),

    // === Upstream data ===
    #[error("Failed to load crosswalk reference: {0}")]
    ReferenceLoad(String),

    #[error("Failed to load source data: {0}")]
    SourceLoad(String),

    #[error("Failed to extract gages: {0}")]
    Extract(String),

    // === Core processing ===
    #[error("Merge failed: {0}")]
    Merge(String),

    #[error("Serialization failed: {0}")]
    Serialize(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DataStreamError {
    /// Get the HTTP status code for this error.
    pub fn http_status_code(&self) -> u16 {
        match self {
            DataStreamError::UnsupportedSource(_) => 400,

            DataStreamError::ReferenceLoad(_)
            | DataStreamError::SourceLoad(_)
            | DataStreamError::Extract(_) => 502,

            _ => 500,
        }
    }
}

impl From<object_store::Error> for DataStreamError {
    fn from(err: object_store::Error) -> Self {
        DataStreamError::SourceLoad(err.to_string())
    }
}
