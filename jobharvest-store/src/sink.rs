//! Result persistence.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Local};
use jobharvest_core::JobRecord;
use tracing::{info, instrument};

use crate::codec::encode_csv;
use crate::error::StoreError;
use crate::persistence::{ensure_dir, save_json, write_atomic};

/// Suffix appended to output names of resumed runs.
pub const RESUMED_SUFFIX: &str = "-resumed";

/// Paths written by a save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedOutput {
    /// Pretty-printed JSON array.
    pub json_path: PathBuf,
    /// CSV with a header row.
    pub csv_path: PathBuf,
}

/// Destination for a run's records.
#[async_trait]
pub trait ResultSink: Send + Sync {
    /// Persists `records`. Returns `None` when there was nothing to write.
    async fn save(
        &self,
        records: &[JobRecord],
        resumed: bool,
    ) -> Result<Option<SavedOutput>, StoreError>;
}

// ============================================================================
// File Sink
// ============================================================================

/// Writes timestamped JSON and CSV files into a directory.
#[derive(Debug, Clone)]
pub struct FileSink {
    output_dir: PathBuf,
}

impl FileSink {
    /// Creates a sink writing into `output_dir`.
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// The output directory.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// File stem for a save at `at`, e.g. `scraped-2025-04-01_09-30-00-resumed`.
    pub fn file_stem(at: DateTime<Local>, resumed: bool) -> String {
        let suffix = if resumed { RESUMED_SUFFIX } else { "" };
        format!("scraped-{}{suffix}", at.format("%Y-%m-%d_%H-%M-%S"))
    }

    /// Saves with an explicit timestamp.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or a file cannot
    /// be written.
    #[instrument(skip(self, records), fields(dir = %self.output_dir.display(), count = records.len()))]
    pub async fn save_at(
        &self,
        records: &[JobRecord],
        resumed: bool,
        at: DateTime<Local>,
    ) -> Result<Option<SavedOutput>, StoreError> {
        if records.is_empty() {
            info!("No records to save");
            return Ok(None);
        }

        ensure_dir(&self.output_dir).await?;
        let stem = Self::file_stem(at, resumed);
        let json_path = self.output_dir.join(format!("{stem}.json"));
        let csv_path = self.output_dir.join(format!("{stem}.csv"));

        save_json(&json_path, records).await?;
        write_atomic(&csv_path, &encode_csv(records)?).await?;

        info!(
            json = %json_path.display(),
            csv = %csv_path.display(),
            "Saved results"
        );
        Ok(Some(SavedOutput {
            json_path,
            csv_path,
        }))
    }
}

#[async_trait]
impl ResultSink for FileSink {
    async fn save(
        &self,
        records: &[JobRecord],
        resumed: bool,
    ) -> Result<Option<SavedOutput>, StoreError> {
        self.save_at(records, resumed, Local::now()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_time() -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 4, 1, 9, 30, 5).unwrap()
    }

    #[test]
    fn test_file_stem() {
        assert_eq!(
            FileSink::file_stem(fixed_time(), false),
            "scraped-2025-04-01_09-30-05"
        );
        assert_eq!(
            FileSink::file_stem(fixed_time(), true),
            "scraped-2025-04-01_09-30-05-resumed"
        );
    }

    #[tokio::test]
    async fn test_empty_state_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let sink = FileSink::new(dir.path().join("out"));

        assert_eq!(sink.save(&[], false).await.unwrap(), None);
        assert!(!dir.path().join("out").exists());
    }

    #[tokio::test]
    async fn test_writes_json_and_csv() {
        let dir = tempfile::tempdir().unwrap();
        let sink = FileSink::new(dir.path().join("nested").join("out"));
        let records = vec![JobRecord {
            title: "Job".to_string(),
            link: "https://a.test/1".to_string(),
            error: Some("invalid or missing link".to_string()),
            ..JobRecord::default()
        }];

        let saved = sink
            .save_at(&records, true, fixed_time())
            .await
            .unwrap()
            .unwrap();

        assert!(saved.json_path.ends_with("scraped-2025-04-01_09-30-05-resumed.json"));
        let json = tokio::fs::read_to_string(&saved.json_path).await.unwrap();
        assert_eq!(JobRecord::list_from_json(&json).unwrap(), records);

        let csv = tokio::fs::read_to_string(&saved.csv_path).await.unwrap();
        assert!(csv.starts_with("\"title\","));
        assert!(csv.contains("\"invalid or missing link\""));
        assert!(!dir.path().join("nested/out/scraped-2025-04-01_09-30-05-resumed.csv.tmp").exists());
    }
}
