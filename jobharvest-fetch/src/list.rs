//! Listing phase: walks the search result pages and collects summaries.

use std::collections::HashSet;

use jobharvest_core::{JobRecord, JobSummary};
use tracing::{debug, error, info, instrument};
use url::Url;

use crate::context::FetchContext;
use crate::error::FetchError;
use crate::extract::{parse_listing, ListingPage, LISTING_CARD};
use crate::gate::DecisionPolicy;

const KEYWORD_PARAM: &str = "search[keywords]";
const PAGE_PARAM: &str = "page";

// ============================================================================
// Outcome
// ============================================================================

/// Why the listing phase stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The record cap was reached.
    CapReached,
    /// A page produced no records.
    EmptyPage,
    /// A page had no next-page link.
    NoNextPage,
    /// The page limit was reached.
    MaxPages,
    /// A page failed and the run was told not to continue.
    Aborted,
}

/// Result of the listing phase.
#[derive(Debug, Clone)]
pub struct CollectOutcome {
    /// Collected records, in discovery order.
    pub records: Vec<JobRecord>,
    /// Listing pages attempted.
    pub pages_visited: u32,
    /// Terminal condition.
    pub stop_reason: StopReason,
}

// ============================================================================
// List Collector
// ============================================================================

/// Drives pagination over the listing pages.
#[derive(Debug)]
pub struct ListCollector<'a> {
    ctx: &'a FetchContext,
    on_error: DecisionPolicy,
    known_links: HashSet<String>,
}

impl<'a> ListCollector<'a> {
    /// Creates a collector. Failed pages stop the run unless
    /// [`with_error_policy`](Self::with_error_policy) says otherwise.
    pub fn new(ctx: &'a FetchContext) -> Self {
        Self {
            ctx,
            on_error: DecisionPolicy::AutoNo,
            known_links: HashSet::new(),
        }
    }

    /// Sets how to decide whether to move on after a page failed.
    #[must_use]
    pub fn with_error_policy(mut self, policy: DecisionPolicy) -> Self {
        self.on_error = policy;
        self
    }

    /// Builds the URL of listing page `page`.
    ///
    /// The keyword and page query parameters of the base URL are replaced;
    /// every other parameter is kept in order.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::InvalidUrl`] if the base URL does not parse.
    pub fn page_url(&self, page: u32) -> Result<String, FetchError> {
        let settings = &self.ctx.settings;
        let mut url = Url::parse(&settings.base_url)
            .map_err(|e| FetchError::InvalidUrl(format!("{}: {e}", settings.base_url)))?;

        let kept: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(key, _)| key != KEYWORD_PARAM && key != PAGE_PARAM)
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect();

        url.query_pairs_mut()
            .clear()
            .extend_pairs(kept)
            .append_pair(KEYWORD_PARAM, &settings.keyword)
            .append_pair(PAGE_PARAM, &page.to_string());

        Ok(url.into())
    }

    fn cap_reached(&self, collected: usize) -> bool {
        self.ctx.settings.max_jobs.is_some_and(|max| collected >= max)
    }

    /// Collects summary records page by page until a terminal condition.
    ///
    /// # Errors
    ///
    /// Returns an error only if page URLs cannot be built. Page failures are
    /// handed to the error policy instead.
    #[instrument(skip(self), fields(keyword = %self.ctx.settings.keyword))]
    pub async fn collect(&mut self) -> Result<CollectOutcome, FetchError> {
        let ctx = self.ctx;
        let settings = &ctx.settings;
        let mut records: Vec<JobRecord> = Vec::new();
        let mut page = settings.start_page.max(1);
        let mut pages_visited = 0;

        let stop_reason = loop {
            if self.cap_reached(records.len()) {
                break StopReason::CapReached;
            }
            if page > settings.max_pages {
                break StopReason::MaxPages;
            }
            if pages_visited > 0 && !settings.page_delay.is_zero() {
                tokio::time::sleep(settings.page_delay).await;
            }

            let url = self.page_url(page)?;
            info!(page, url = %url, "Fetching listing page");
            pages_visited += 1;

            match self.fetch_page(&url).await {
                Ok(listing) => {
                    if listing.jobs.is_empty() {
                        info!(page, "No jobs on page, stopping");
                        break StopReason::EmptyPage;
                    }

                    let found = listing.jobs.len();
                    let kept = self.append(&mut records, listing.jobs);
                    info!(page, found, kept, total = records.len(), "Listing page collected");

                    if self.cap_reached(records.len()) {
                        break StopReason::CapReached;
                    }
                    if !listing.has_next {
                        info!(page, "No next page link, stopping");
                        break StopReason::NoNextPage;
                    }
                }
                Err(err) => {
                    error!(page, error = %err, "Listing page failed");
                    let prompt = format!("Page {page} failed ({err}). Continue with the next page?");
                    if !self.on_error.decide(&prompt).await {
                        break StopReason::Aborted;
                    }
                }
            }

            page += 1;
        };

        info!(
            total = records.len(),
            pages_visited,
            stop_reason = ?stop_reason,
            "Listing phase finished"
        );

        Ok(CollectOutcome {
            records,
            pages_visited,
            stop_reason,
        })
    }

    /// Appends page jobs, honoring deduplication and the remaining cap.
    /// Returns how many were kept.
    fn append(&mut self, records: &mut Vec<JobRecord>, jobs: Vec<JobSummary>) -> usize {
        let dedupe = self.ctx.settings.dedupe_links;
        let remaining = self
            .ctx
            .settings
            .max_jobs
            .map_or(usize::MAX, |max| max.saturating_sub(records.len()));

        let before = records.len();
        for job in jobs {
            if records.len() - before >= remaining {
                break;
            }
            if dedupe && !job.link.is_empty() && !self.known_links.insert(job.link.clone()) {
                debug!(link = %job.link, "Skipping already collected link");
                continue;
            }
            records.push(JobRecord::from(job));
        }
        records.len() - before
    }

    async fn fetch_page(&self, url: &str) -> Result<ListingPage, FetchError> {
        let driver = &self.ctx.driver;
        let settings = &self.ctx.settings;
        let page_url = Url::parse(url).map_err(|e| FetchError::InvalidUrl(format!("{url}: {e}")))?;
        let page_url = &page_url;

        settings
            .navigation_retry
            .run("Page navigation", || async move { driver.goto(url).await })
            .await?;

        settings
            .extraction_retry
            .run("Listing extraction", || async move {
                // A page without cards is a valid result, not a failure.
                match driver.wait_for(LISTING_CARD, settings.wait_timeout).await {
                    Ok(()) | Err(FetchError::SelectorTimeout { .. }) => {}
                    Err(err) => return Err(err),
                }
                let html = driver.content().await?;
                Ok(parse_listing(&html, page_url))
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::Confirmer;
    use crate::host::StaticPageDriver;
    use crate::testing::{job_link, listing_html, settings};
    use async_trait::async_trait;
    use std::sync::Arc;

    fn context(driver: &Arc<StaticPageDriver>, settings: crate::FetchSettings) -> FetchContext {
        FetchContext::new(driver.clone(), settings)
    }

    /// Registers listing pages with the given card counts. Every page but
    /// the last advertises a next page.
    fn driver_with_pages(settings: &crate::FetchSettings, counts: &[usize]) -> Arc<StaticPageDriver> {
        let probe = FetchContext::new(Arc::new(StaticPageDriver::new()), settings.clone());
        let collector = ListCollector::new(&probe);

        let mut driver = StaticPageDriver::new();
        for (i, count) in counts.iter().enumerate() {
            let page = u32::try_from(i).unwrap() + settings.start_page;
            let has_next = i + 1 < counts.len();
            driver = driver.with_page(
                collector.page_url(page).unwrap(),
                listing_html(page, *count, has_next),
            );
        }
        Arc::new(driver)
    }

    #[test]
    fn test_page_url_replaces_keyword_and_page() {
        let settings = crate::FetchSettings {
            base_url: "https://crowdworks.jp/public/jobs/search?hide_expired=true&order=new&search%5Bkeywords%5D=old&page=9".to_string(),
            ..crate::FetchSettings::default()
        }
        .with_keyword("動画");
        let ctx = FetchContext::new(Arc::new(StaticPageDriver::new()), settings);
        let url = ListCollector::new(&ctx).page_url(2).unwrap();

        let parsed = Url::parse(&url).unwrap();
        let pairs: Vec<(String, String)> = parsed
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("hide_expired".to_string(), "true".to_string()),
                ("order".to_string(), "new".to_string()),
                ("search[keywords]".to_string(), "動画".to_string()),
                ("page".to_string(), "2".to_string()),
            ]
        );
    }

    #[test]
    fn test_page_url_rejects_bad_base() {
        let settings = crate::FetchSettings {
            base_url: "not a url".to_string(),
            ..crate::FetchSettings::default()
        };
        let ctx = FetchContext::new(Arc::new(StaticPageDriver::new()), settings);
        assert!(matches!(
            ListCollector::new(&ctx).page_url(1),
            Err(FetchError::InvalidUrl(_))
        ));
    }

    #[tokio::test]
    async fn test_stops_on_empty_page() {
        let settings = settings();
        let driver = driver_with_pages(&settings, &[3, 2, 0]);
        let ctx = context(&driver, settings);

        let outcome = ListCollector::new(&ctx).collect().await.unwrap();

        assert_eq!(outcome.records.len(), 5);
        assert_eq!(outcome.pages_visited, 3);
        assert_eq!(outcome.stop_reason, StopReason::EmptyPage);
        assert_eq!(driver.visits().len(), 3);
        assert_eq!(outcome.records[0].link, job_link(1, 0));
        assert_eq!(outcome.records[4].link, job_link(2, 1));
    }

    #[tokio::test]
    async fn test_cap_truncates_and_skips_next_page() {
        let settings = settings().with_max_jobs(Some(4));
        let driver = driver_with_pages(&settings, &[5, 5]);
        let ctx = context(&driver, settings);

        let outcome = ListCollector::new(&ctx).collect().await.unwrap();

        assert_eq!(outcome.records.len(), 4);
        assert_eq!(outcome.stop_reason, StopReason::CapReached);
        assert_eq!(driver.visits().len(), 1);
    }

    #[tokio::test]
    async fn test_stops_without_next_link() {
        let settings = settings();
        let driver = driver_with_pages(&settings, &[2, 2]);
        let ctx = context(&driver, settings);

        let outcome = ListCollector::new(&ctx).collect().await.unwrap();

        assert_eq!(outcome.records.len(), 4);
        assert_eq!(outcome.stop_reason, StopReason::NoNextPage);
    }

    #[tokio::test]
    async fn test_stops_at_max_pages() {
        let mut settings = settings().with_start_page(2);
        settings.max_pages = 3;
        let driver = driver_with_pages(&settings, &[1, 1, 1, 1]);
        let ctx = context(&driver, settings);

        let outcome = ListCollector::new(&ctx).collect().await.unwrap();

        assert_eq!(outcome.pages_visited, 2);
        assert_eq!(outcome.records.len(), 2);
        assert_eq!(outcome.stop_reason, StopReason::MaxPages);
        assert_eq!(outcome.records[0].link, job_link(2, 0));
    }

    #[tokio::test]
    async fn test_transient_navigation_failure_is_retried() {
        let settings = settings();
        let probe = FetchContext::new(Arc::new(StaticPageDriver::new()), settings.clone());
        let first = ListCollector::new(&probe).page_url(1).unwrap();
        let driver = Arc::new(
            StaticPageDriver::new()
                .with_page(first.clone(), listing_html(1, 2, false))
                .with_failures(first.clone(), 2),
        );
        let ctx = context(&driver, settings);

        let outcome = ListCollector::new(&ctx).collect().await.unwrap();

        assert_eq!(outcome.records.len(), 2);
        assert_eq!(driver.visit_count(&first), 3);
    }

    struct Always(bool);

    #[async_trait]
    impl Confirmer for Always {
        async fn confirm(&self, _prompt: &str) -> bool {
            self.0
        }
    }

    #[tokio::test]
    async fn test_failed_page_consults_error_policy() {
        let settings = settings();
        let probe = FetchContext::new(Arc::new(StaticPageDriver::new()), settings.clone());
        let collector = ListCollector::new(&probe);
        let page2 = collector.page_url(2).unwrap();
        let driver = Arc::new(
            StaticPageDriver::new()
                .with_page(collector.page_url(1).unwrap(), listing_html(1, 2, true))
                .with_page(collector.page_url(3).unwrap(), listing_html(3, 1, false))
                .with_failures(page2.clone(), 10),
        );
        let ctx = context(&driver, settings);

        let aborted = ListCollector::new(&ctx).collect().await.unwrap();
        assert_eq!(aborted.stop_reason, StopReason::Aborted);
        assert_eq!(aborted.records.len(), 2);

        let resumed = ListCollector::new(&ctx)
            .with_error_policy(DecisionPolicy::ask(Always(true)))
            .collect()
            .await
            .unwrap();
        assert_eq!(resumed.stop_reason, StopReason::NoNextPage);
        assert_eq!(resumed.records.len(), 3);
    }

    #[tokio::test]
    async fn test_dedupe_skips_links_seen_on_earlier_pages() {
        let settings = settings().with_dedupe(true);
        let probe = FetchContext::new(Arc::new(StaticPageDriver::new()), settings.clone());
        let collector = ListCollector::new(&probe);
        // Page 2 repeats the first two cards of page 1 and adds nothing new.
        let driver = Arc::new(
            StaticPageDriver::new()
                .with_page(collector.page_url(1).unwrap(), listing_html(1, 3, true))
                .with_page(collector.page_url(2).unwrap(), listing_html(1, 2, false)),
        );
        let ctx = context(&driver, settings);

        let outcome = ListCollector::new(&ctx).collect().await.unwrap();

        let links: Vec<&str> = outcome.records.iter().map(|r| r.link.as_str()).collect();
        assert_eq!(links, vec![job_link(1, 0), job_link(1, 1), job_link(1, 2)]);
        assert_eq!(outcome.pages_visited, 2);
        assert_eq!(outcome.stop_reason, StopReason::NoNextPage);
    }

    #[tokio::test]
    async fn test_duplicates_kept_without_dedupe() {
        let settings = settings();
        let probe = FetchContext::new(Arc::new(StaticPageDriver::new()), settings.clone());
        let collector = ListCollector::new(&probe);
        let driver = Arc::new(
            StaticPageDriver::new()
                .with_page(collector.page_url(1).unwrap(), listing_html(1, 3, true))
                .with_page(collector.page_url(2).unwrap(), listing_html(1, 2, false)),
        );
        let ctx = context(&driver, settings);

        let outcome = ListCollector::new(&ctx).collect().await.unwrap();
        assert_eq!(outcome.records.len(), 5);
    }
}
