//! Fetch error types.

use std::time::Duration;
use thiserror::Error;

// ============================================================================
// Main Fetch Error
// ============================================================================

/// Error type for page driving and extraction.
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("HTTP {status} for {url}")]
    Status {
        /// Requested URL.
        url: String,
        /// Response status code.
        status: u16,
    },

    /// Navigation failed for a reason other than HTTP.
    #[error("Navigation to {url} failed: {reason}")]
    Navigation {
        /// Requested URL.
        url: String,
        /// Failure description.
        reason: String,
    },

    /// A selector did not appear on the page in time.
    #[error("Selector {selector} not found within {timeout:?}")]
    SelectorTimeout {
        /// The awaited selector.
        selector: String,
        /// How long the driver waited.
        timeout: Duration,
    },

    /// A selector could not be parsed.
    #[error("Invalid selector: {0}")]
    InvalidSelector(String),

    /// A URL could not be parsed or built.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Content was requested before any page was loaded.
    #[error("No page loaded")]
    NoPage,

    /// The driver has been closed.
    #[error("Page driver is closed")]
    Closed,

    /// All retry attempts failed.
    #[error("{label} failed after {attempts} attempts: {source}")]
    RetriesExhausted {
        /// Operation label.
        label: String,
        /// Attempts made.
        attempts: u32,
        /// The error from the final attempt.
        #[source]
        source: Box<FetchError>,
    },
}

impl FetchError {
    /// Returns true if the failure might clear on a later attempt.
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            FetchError::Status { status, .. } => *status == 429 || *status >= 500,
            FetchError::Navigation { .. } | FetchError::SelectorTimeout { .. } => true,
            FetchError::InvalidSelector(_)
            | FetchError::InvalidUrl(_)
            | FetchError::NoPage
            | FetchError::Closed
            | FetchError::RetriesExhausted { .. } => false,
        }
    }

    /// Returns the error produced by the last attempt, looking through
    /// [`FetchError::RetriesExhausted`].
    pub fn last_error(&self) -> &FetchError {
        match self {
            FetchError::RetriesExhausted { source, .. } => source.last_error(),
            other => other,
        }
    }
}
