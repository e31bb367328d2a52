//! Fetch context shared by the listing and detail phases.
//!
//! The context bundles the page driver with the settings that shape a run,
//! so both collectors see the same timeouts and retry policies.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::driver::PageDriver;
use crate::retry::RetryExecutor;

/// Default listing search URL.
pub const DEFAULT_BASE_URL: &str = "https://crowdworks.jp/public/jobs/search?hide_expired=true&order=new&search%5Bkeywords%5D=%E3%82%B7%E3%83%A7%E3%83%BC%E3%83%88";

/// Default search keyword.
pub const DEFAULT_KEYWORD: &str = "ショート";

// ============================================================================
// Fetch Settings
// ============================================================================

/// Settings for a scraping run.
#[derive(Debug, Clone)]
pub struct FetchSettings {
    /// Listing search URL; keyword and page parameters are filled in per page.
    pub base_url: String,
    /// Search keyword.
    pub keyword: String,
    /// First listing page to visit (1-based).
    pub start_page: u32,
    /// Highest listing page to visit.
    pub max_pages: u32,
    /// Cap on collected records, and on detail attempts.
    pub max_jobs: Option<usize>,
    /// Pause between listing pages.
    pub page_delay: Duration,
    /// Detail records processed between confirmations. Zero disables the gate.
    pub chunk_size: usize,
    /// How long to wait for a page's marker element.
    pub wait_timeout: Duration,
    /// Retry policy around navigation.
    pub navigation_retry: RetryExecutor,
    /// Retry policy around waiting and extraction.
    pub extraction_retry: RetryExecutor,
    /// Drop listing records whose link was already seen.
    pub dedupe_links: bool,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            keyword: DEFAULT_KEYWORD.to_string(),
            start_page: 1,
            max_pages: 5,
            max_jobs: None,
            page_delay: Duration::from_secs(2),
            chunk_size: 5,
            wait_timeout: Duration::from_secs(15),
            navigation_retry: RetryExecutor::new(3).with_base_delay(Duration::from_secs(2)),
            extraction_retry: RetryExecutor::new(3).with_base_delay(Duration::from_secs(1)),
            dedupe_links: false,
        }
    }
}

impl FetchSettings {
    /// Sets the search keyword.
    pub fn with_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keyword = keyword.into();
        self
    }

    /// Sets the first listing page. Page numbers start at 1.
    pub fn with_start_page(mut self, page: u32) -> Self {
        self.start_page = page.max(1);
        self
    }

    /// Sets the record cap.
    pub fn with_max_jobs(mut self, max_jobs: Option<usize>) -> Self {
        self.max_jobs = max_jobs;
        self
    }

    /// Sets the confirmation chunk size.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Enables link deduplication across pages and runs.
    pub fn with_dedupe(mut self, dedupe: bool) -> Self {
        self.dedupe_links = dedupe;
        self
    }

    /// Removes every pause and retry delay. Used by tests.
    pub fn without_delays(mut self) -> Self {
        self.page_delay = Duration::ZERO;
        self.navigation_retry = self.navigation_retry.with_base_delay(Duration::ZERO);
        self.extraction_retry = self.extraction_retry.with_base_delay(Duration::ZERO);
        self
    }
}

// ============================================================================
// Fetch Context
// ============================================================================

/// Driver plus settings, handed to both collectors.
#[derive(Clone)]
pub struct FetchContext {
    /// The page session.
    pub driver: Arc<dyn PageDriver>,
    /// Run settings.
    pub settings: FetchSettings,
}

impl FetchContext {
    /// Creates a context around a driver.
    pub fn new(driver: Arc<dyn PageDriver>, settings: FetchSettings) -> Self {
        Self { driver, settings }
    }
}

impl fmt::Debug for FetchContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchContext")
            .field("driver", &self.driver.id())
            .field("settings", &self.settings)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = FetchSettings::default();
        assert_eq!(settings.keyword, "ショート");
        assert_eq!(settings.start_page, 1);
        assert_eq!(settings.max_pages, 5);
        assert_eq!(settings.chunk_size, 5);
        assert_eq!(settings.navigation_retry.max_attempts, 3);
        assert_eq!(
            settings.navigation_retry.base_delay,
            Duration::from_millis(2000)
        );
        assert_eq!(
            settings.extraction_retry.base_delay,
            Duration::from_millis(1000)
        );
    }

    #[test]
    fn test_start_page_floor() {
        assert_eq!(FetchSettings::default().with_start_page(0).start_page, 1);
    }
}
