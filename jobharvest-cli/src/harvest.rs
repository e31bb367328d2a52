//! Run orchestration: load or collect, enrich, persist, close.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use jobharvest_fetch::{
    ChunkGate, Confirmer, DecisionPolicy, DetailEnricher, EnrichReport, FetchContext,
    ListCollector,
};
use jobharvest_store::{ResultSink, RunState};
use serde::Serialize;
use tracing::{error, info, instrument, warn};

// ============================================================================
// Options
// ============================================================================

/// Per-run choices, resolved from flags and the environment.
#[derive(Debug, Clone, Default)]
pub struct HarvestOptions {
    /// Prior output to resume from. Skips the listing phase.
    pub input_file: Option<PathBuf>,
    /// Record cap for the listing phase and attempt limit for details.
    pub max_jobs: Option<usize>,
    /// Answer yes at every chunk boundary.
    pub skip_chunk_confirm: bool,
    /// Forced detail-phase decision; `None` asks.
    pub fetch_details: Option<bool>,
    /// Drop listing records with an already collected link.
    pub dedupe: bool,
    /// Running unattended; list-phase failures stop instead of asking.
    pub unattended: bool,
}

// ============================================================================
// Summary
// ============================================================================

/// What a run did.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    /// The run started from a saved file.
    pub resumed: bool,
    /// Records held at the end of the run.
    pub total: usize,
    /// Records with a description or an error.
    pub resolved: usize,
    /// Records still needing details.
    pub unresolved: usize,
    /// Listing pages attempted; absent on resumed runs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pages_visited: Option<u32>,
    /// Why the listing phase stopped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_reason: Option<String>,
    /// The detail phase ran.
    pub details_fetched: bool,
    /// Detail records attempted.
    pub attempted: usize,
    /// Detail pages read.
    pub succeeded: usize,
    /// Records marked with an error.
    pub failed: usize,
    /// A chunk boundary answer stopped the detail phase.
    pub stopped_by_gate: bool,
    /// `--max-jobs` stopped the detail phase.
    pub limit_reached: bool,
    /// Saved JSON file, if anything was written.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub json_path: Option<PathBuf>,
    /// Saved CSV file, if anything was written.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub csv_path: Option<PathBuf>,
}

impl RunSummary {
    fn record_enrichment(&mut self, report: EnrichReport) {
        self.details_fetched = true;
        self.attempted = report.attempted;
        self.succeeded = report.succeeded;
        self.failed = report.failed;
        self.stopped_by_gate = report.stopped_by_gate;
        self.limit_reached = report.limit_reached;
    }
}

// ============================================================================
// Harvest
// ============================================================================

/// One harvest run over a single page driver.
pub struct Harvest {
    ctx: FetchContext,
    sink: Arc<dyn ResultSink>,
    confirmer: Arc<dyn Confirmer>,
    options: HarvestOptions,
}

impl Harvest {
    pub fn new(
        ctx: FetchContext,
        sink: Arc<dyn ResultSink>,
        confirmer: Arc<dyn Confirmer>,
        options: HarvestOptions,
    ) -> Self {
        Self {
            ctx,
            sink,
            confirmer,
            options,
        }
    }

    /// Runs the harvest and closes the driver on every path.
    pub async fn run(&self) -> Result<RunSummary> {
        let result = self.execute().await;

        if let Err(e) = self.ctx.driver.close().await {
            warn!(error = %e, "Failed to close page driver");
        }

        result
    }

    fn ask(&self) -> DecisionPolicy {
        DecisionPolicy::Ask(Arc::clone(&self.confirmer))
    }

    #[instrument(skip(self), fields(driver = self.ctx.driver.id()))]
    async fn execute(&self) -> Result<RunSummary> {
        let mut state = match &self.options.input_file {
            Some(path) => RunState::load(path)
                .await
                .with_context(|| format!("Failed to load {}", path.display()))?,
            None => RunState::new(),
        };

        let mut summary = RunSummary {
            resumed: state.is_resumed(),
            ..RunSummary::default()
        };
        let mut list_failure = None;

        if !state.is_resumed() {
            let policy = if self.options.unattended {
                DecisionPolicy::AutoNo
            } else {
                self.ask()
            };
            let mut collector = ListCollector::new(&self.ctx).with_error_policy(policy);

            match collector.collect().await {
                Ok(outcome) => {
                    summary.pages_visited = Some(outcome.pages_visited);
                    summary.stop_reason = Some(format!("{:?}", outcome.stop_reason));
                    if self.options.dedupe {
                        state.merge(outcome.records);
                    } else {
                        state.extend(outcome.records);
                    }
                }
                Err(e) => {
                    error!(error = %e, "Listing phase failed");
                    list_failure = Some(e);
                }
            }
        }

        let pending = state.unresolved_count();
        if pending > 0 && self.should_fetch_details(pending).await {
            let gate_policy = if self.options.skip_chunk_confirm {
                DecisionPolicy::AutoYes
            } else {
                self.ask()
            };
            let gate = ChunkGate::new(self.ctx.settings.chunk_size, gate_policy);
            let report = DetailEnricher::new(&self.ctx, gate)
                .with_limit(self.options.max_jobs)
                .enrich(state.unresolved_mut())
                .await;
            summary.record_enrichment(report);
        } else if pending == 0 {
            info!("No records need details");
        } else {
            info!(pending, "Skipping detail phase");
        }

        summary.total = state.len();
        summary.resolved = state.resolved_count();
        summary.unresolved = state.unresolved_count();

        let saved = self
            .sink
            .save(state.records(), state.is_resumed())
            .await
            .context("Failed to save results")?;
        if let Some(saved) = saved {
            summary.json_path = Some(saved.json_path);
            summary.csv_path = Some(saved.csv_path);
        }

        if let Some(e) = list_failure {
            return Err(anyhow::Error::new(e)
                .context("Listing phase failed; collected records were saved"));
        }
        Ok(summary)
    }

    async fn should_fetch_details(&self, pending: usize) -> bool {
        match self.options.fetch_details {
            Some(forced) => forced,
            None => {
                let prompt = format!("Fetch details for {pending} records now?");
                self.confirmer.confirm(&prompt).await
            }
        }
    }
}
