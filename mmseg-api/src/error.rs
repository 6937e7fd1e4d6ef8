//! API error types

use mmseg_core::{ConfigError, SegmentError};
use thiserror::Error;

/// API-level errors
#[derive(Error, Debug)]
pub enum ApiError {
    /// Segmentation failed on an internal invariant
    #[error("segmentation error: {0}")]
    Segment(#[from] SegmentError),

    /// Configuration error
    #[error("configuration error: {0}")]
    Configuration(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Input bytes could not be decoded
    #[error("encoding error: {0}")]
    Encoding(String),

    /// Input rejected before segmentation
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Serialization error
    #[cfg(feature = "json")]
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<ConfigError> for ApiError {
    fn from(err: ConfigError) -> Self {
        ApiError::Configuration(err.to_string())
    }
}

/// Result type for API operations
pub type Result<T> = std::result::Result<T, ApiError>;
