//! Run state: the ordered record set carried across both phases.

use std::collections::HashSet;
use std::path::Path;

use jobharvest_core::JobRecord;
use tracing::{info, warn};

use crate::error::StoreError;
use crate::source::load_records;

/// Records of one run, in discovery order.
///
/// Links are indexed so that merging never reintroduces a known link.
/// Records with an empty link are never deduplicated.
#[derive(Debug, Clone, Default)]
pub struct RunState {
    records: Vec<JobRecord>,
    index: HashSet<String>,
    resumed: bool,
}

impl RunState {
    /// Creates an empty state for a fresh run.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a state from already decoded records.
    ///
    /// Later duplicates of a link are dropped with a warning and invalid
    /// numeric values are cleared.
    pub fn from_records(records: Vec<JobRecord>) -> Self {
        let mut state = Self::new();
        let mut dropped = 0usize;

        for mut record in records {
            if let Err(e) = record.validate() {
                warn!(link = %record.link, error = %e, "Clearing invalid value from input");
                record.sanitize();
            }
            if record.link.is_empty() || state.index.insert(record.link.clone()) {
                state.records.push(record);
            } else {
                warn!(link = %record.link, "Dropping duplicate record from input");
                dropped += 1;
            }
        }

        if dropped > 0 {
            warn!(dropped, kept = state.records.len(), "Collapsed duplicate links");
        }
        state
    }

    /// Loads a prior run's output for resuming.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnsupportedFormat`] unless the extension is
    /// `.json` or `.csv`, [`StoreError::NotFound`] if the file is missing,
    /// and a decode error if the contents are malformed.
    pub async fn load(path: &Path) -> Result<Self, StoreError> {
        let records = load_records(path).await?;
        let mut state = Self::from_records(records);
        state.resumed = true;

        info!(
            path = %path.display(),
            total = state.len(),
            resolved = state.resolved_count(),
            unresolved = state.unresolved_count(),
            "Loaded prior run"
        );
        Ok(state)
    }

    /// Appends records whose link is not yet known. Returns how many were
    /// added.
    pub fn merge(&mut self, records: impl IntoIterator<Item = JobRecord>) -> usize {
        let before = self.records.len();
        for record in records {
            if record.link.is_empty() || self.index.insert(record.link.clone()) {
                self.records.push(record);
            }
        }
        self.records.len() - before
    }

    /// Appends records without deduplication.
    pub fn extend(&mut self, records: impl IntoIterator<Item = JobRecord>) {
        for record in records {
            if !record.link.is_empty() {
                self.index.insert(record.link.clone());
            }
            self.records.push(record);
        }
    }

    /// Mutable view of the records still needing details, in order.
    pub fn unresolved_mut(&mut self) -> impl Iterator<Item = &mut JobRecord> {
        self.records.iter_mut().filter(|r| !r.is_resolved())
    }

    /// All records.
    pub fn records(&self) -> &[JobRecord] {
        &self.records
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the state holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records with a detail description or an error.
    pub fn resolved_count(&self) -> usize {
        self.records.iter().filter(|r| r.is_resolved()).count()
    }

    /// Records still needing details.
    pub fn unresolved_count(&self) -> usize {
        self.len() - self.resolved_count()
    }

    /// Whether this state was loaded from a prior run.
    pub fn is_resumed(&self) -> bool {
        self.resumed
    }
}
