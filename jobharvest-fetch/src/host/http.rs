//! HTTP page driver.
//!
//! Fetches server-rendered documents with reqwest. There is no script
//! execution, so waiting for a selector is a single check against the
//! fetched document.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, instrument};

use crate::driver::PageDriver;
use crate::error::FetchError;
use crate::extract::document_matches;

/// Default request timeout.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default user agent.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (compatible; ScraperBot/1.0)";

#[derive(Debug)]
struct LoadedPage {
    url: String,
    html: String,
}

// ============================================================================
// HTTP Page Driver
// ============================================================================

/// Page driver backed by a reqwest client.
#[derive(Debug)]
pub struct HttpPageDriver {
    client: Client,
    current: Mutex<Option<LoadedPage>>,
    closed: AtomicBool,
}

impl HttpPageDriver {
    /// Creates a driver with the default user agent and timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new() -> Result<Self, FetchError> {
        Self::with_options(DEFAULT_USER_AGENT, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Creates a driver with a custom user agent and request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built, which only
    /// happens when the TLS backend fails to initialize.
    pub fn with_options(user_agent: &str, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;

        Ok(Self {
            client,
            current: Mutex::new(None),
            closed: AtomicBool::new(false),
        })
    }

    fn ensure_open(&self) -> Result<(), FetchError> {
        if self.closed.load(Ordering::SeqCst) {
            Err(FetchError::Closed)
        } else {
            Ok(())
        }
    }

    fn with_page<T>(&self, f: impl FnOnce(&LoadedPage) -> T) -> Result<T, FetchError> {
        let guard = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        guard.as_ref().map(f).ok_or(FetchError::NoPage)
    }
}

#[async_trait]
impl PageDriver for HttpPageDriver {
    fn id(&self) -> &str {
        "http"
    }

    #[instrument(skip(self), fields(url = %url))]
    async fn goto(&self, url: &str) -> Result<(), FetchError> {
        self.ensure_open()?;
        debug!("GET request");

        let response = self.client.get(url).send().await?;
        let status = response.status();
        debug!(status = %status, "Response received");

        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let html = response.text().await?;
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        *current = Some(LoadedPage {
            url: url.to_string(),
            html,
        });
        Ok(())
    }

    async fn wait_for(&self, selector: &str, timeout: Duration) -> Result<(), FetchError> {
        self.ensure_open()?;
        let html = self.with_page(|page| page.html.clone())?;

        if document_matches(&html, selector)? {
            Ok(())
        } else {
            debug!(
                selector,
                url = %self.with_page(|page| page.url.clone()).unwrap_or_default(),
                "Selector absent from fetched document"
            );
            Err(FetchError::SelectorTimeout {
                selector: selector.to_string(),
                timeout,
            })
        }
    }

    async fn content(&self) -> Result<String, FetchError> {
        self.ensure_open()?;
        self.with_page(|page| page.html.clone())
    }

    async fn close(&self) -> Result<(), FetchError> {
        if !self.closed.swap(true, Ordering::SeqCst) {
            debug!("Closing HTTP page driver");
            let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
            *current = None;
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_content_before_goto() {
        let driver = HttpPageDriver::new().unwrap();
        assert!(matches!(driver.content().await, Err(FetchError::NoPage)));
    }

    #[tokio::test]
    async fn test_closed_driver_rejects_calls() {
        let driver = HttpPageDriver::new().unwrap();
        driver.close().await.unwrap();
        driver.close().await.unwrap();

        assert!(matches!(
            driver.goto("https://example.com").await,
            Err(FetchError::Closed)
        ));
        assert!(matches!(driver.content().await, Err(FetchError::Closed)));
    }
}
