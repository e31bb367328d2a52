//! Page driver trait.
//!
//! A driver owns one page session: it navigates, waits for content to
//! render and hands back the current document. The collectors only talk to
//! this trait, so a headless browser, a plain HTTP fetcher or an in-memory
//! fixture can sit behind it.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::FetchError;

/// A single page session.
///
/// Calls are strictly sequential; the pipeline awaits each navigation
/// before starting the next.
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Short identifier used in logs (e.g., "http", "memory").
    fn id(&self) -> &str;

    /// Navigates to `url`, replacing the current document.
    async fn goto(&self, url: &str) -> Result<(), FetchError>;

    /// Waits until `selector` matches an element of the current document.
    async fn wait_for(&self, selector: &str, timeout: Duration) -> Result<(), FetchError>;

    /// Returns the HTML of the current document.
    async fn content(&self) -> Result<String, FetchError>;

    /// Releases the session. Further calls fail with [`FetchError::Closed`].
    async fn close(&self) -> Result<(), FetchError>;
}
