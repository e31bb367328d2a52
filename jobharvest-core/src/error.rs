//! Core error types for `JobHarvest`.

use thiserror::Error;

/// Core error type for record operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A record carries a value outside its valid range.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
