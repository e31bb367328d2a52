//! Store error types.

use std::path::PathBuf;

use jobharvest_core::CoreError;
use thiserror::Error;

/// Errors that can occur while loading or saving run state.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The input file does not exist.
    #[error("Input file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The input file has an extension other than `.json` or `.csv`.
    #[error("Unsupported input format: {0} (expected .json or .csv)")]
    UnsupportedFormat(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// CSV error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Record decoding error.
    #[error("Invalid record data: {0}")]
    Core(#[from] CoreError),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl StoreError {
    /// Returns true if the error concerns the caller's input rather than
    /// the environment.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            StoreError::NotFound(_)
                | StoreError::UnsupportedFormat(_)
                | StoreError::Serialization(_)
                | StoreError::Csv(_)
                | StoreError::Core(_)
        )
    }
}
