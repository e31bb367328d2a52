//! Detail phase: visits each unresolved record's page and merges the
//! extracted fields into it.

use jobharvest_core::{JobDetails, JobRecord};
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::context::FetchContext;
use crate::error::FetchError;
use crate::extract::{parse_details, DETAIL_READY};
use crate::gate::ChunkGate;

/// Error stored on records whose link cannot be visited.
pub const INVALID_LINK: &str = "invalid or missing link";

/// Counters from one enrichment pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnrichReport {
    /// Records for which a detail fetch was attempted or skipped as invalid.
    pub attempted: usize,
    /// Records whose detail page was read. One without a description
    /// stays unresolved.
    pub succeeded: usize,
    /// Records that were marked with an error.
    pub failed: usize,
    /// The chunk gate answered "no".
    pub stopped_by_gate: bool,
    /// The attempt limit stopped the pass with records left over.
    pub limit_reached: bool,
}

/// Returns true if `link` is an absolute http(s) URL with a host.
pub fn is_fetchable(link: &str) -> bool {
    Url::parse(link).is_ok_and(|url| {
        matches!(url.scheme(), "http" | "https") && url.host_str().is_some_and(|h| !h.is_empty())
    })
}

// ============================================================================
// Detail Enricher
// ============================================================================

/// Fills in detail fields for unresolved records, one page at a time.
#[derive(Debug)]
pub struct DetailEnricher<'a> {
    ctx: &'a FetchContext,
    gate: ChunkGate,
    limit: Option<usize>,
}

impl<'a> DetailEnricher<'a> {
    /// Creates an enricher with the given chunk gate and no attempt limit.
    pub fn new(ctx: &'a FetchContext, gate: ChunkGate) -> Self {
        Self {
            ctx,
            gate,
            limit: None,
        }
    }

    /// Caps the number of records attempted in this pass.
    #[must_use]
    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    /// Enriches every unresolved record yielded by `records`, in order.
    ///
    /// Resolved records are skipped. Failures are stored on the record and
    /// never abort the pass; only the gate or the limit stop it early.
    #[instrument(skip_all, fields(driver = self.ctx.driver.id()))]
    pub async fn enrich<'r, I>(&self, records: I) -> EnrichReport
    where
        I: IntoIterator<Item = &'r mut JobRecord>,
    {
        let queue: Vec<&mut JobRecord> = records
            .into_iter()
            .filter(|record| !record.is_resolved())
            .collect();
        let total = queue.len();
        info!(total, limit = ?self.limit, chunk_size = self.gate.chunk_size, "Starting detail enrichment");

        let mut report = EnrichReport::default();

        for (index, record) in queue.into_iter().enumerate() {
            if self.limit_hit(report.attempted) {
                report.limit_reached = true;
                info!(attempted = report.attempted, "Detail limit reached");
                break;
            }

            if self.enrich_one(record).await {
                report.succeeded += 1;
            } else {
                report.failed += 1;
            }
            report.attempted += 1;

            let more_queued = index + 1 < total;
            if more_queued && self.gate.fires_at(report.attempted) {
                if self.limit_hit(report.attempted) {
                    report.limit_reached = true;
                    info!(attempted = report.attempted, "Detail limit reached at chunk boundary");
                    break;
                }
                if !self.gate.should_continue(report.attempted).await {
                    report.stopped_by_gate = true;
                    info!(attempted = report.attempted, "Detail enrichment stopped at chunk boundary");
                    break;
                }
            }
        }

        info!(
            attempted = report.attempted,
            succeeded = report.succeeded,
            failed = report.failed,
            "Detail enrichment finished"
        );
        report
    }

    fn limit_hit(&self, attempted: usize) -> bool {
        self.limit.is_some_and(|limit| attempted >= limit)
    }

    /// Enriches one record. Returns true on success.
    async fn enrich_one(&self, record: &mut JobRecord) -> bool {
        if !is_fetchable(&record.link) {
            warn!(link = %record.link, title = %record.title, "Skipping record with unusable link");
            record.mark_failed(INVALID_LINK);
            return false;
        }

        match self.fetch_details(&record.link).await {
            Ok(details) => {
                if details.detail_description.is_none() {
                    debug!(link = %record.link, "Detail page has no description, record stays pending");
                }
                record.apply_details(details);
                debug!(link = %record.link, "Record enriched");
                true
            }
            Err(err) => {
                let cause = err.last_error();
                warn!(link = %record.link, error = %cause, "Detail scraping failed");
                record.mark_failed(format!("Detail scraping failed: {cause}"));
                false
            }
        }
    }

    async fn fetch_details(&self, link: &str) -> Result<JobDetails, FetchError> {
        let driver = &self.ctx.driver;
        let settings = &self.ctx.settings;

        settings
            .extraction_retry
            .run("Detail extraction", || async move {
                driver.goto(link).await?;
                driver.wait_for(DETAIL_READY, settings.wait_timeout).await?;
                let html = driver.content().await?;
                Ok(parse_details(&html))
            })
            .await
    }
}
