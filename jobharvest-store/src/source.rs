//! Readers for previously saved output.

use std::path::Path;

use async_trait::async_trait;
use jobharvest_core::JobRecord;
use tracing::{debug, instrument};

use crate::codec::decode_csv;
use crate::error::StoreError;
use crate::persistence::read_text;

/// Decodes saved records of one file format.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Lowercase file extension handled by this source.
    fn extension(&self) -> &'static str;

    /// Decodes file contents into records.
    fn decode(&self, text: &str) -> Result<Vec<JobRecord>, StoreError>;

    /// Reads and decodes the file at `path`.
    async fn load(&self, path: &Path) -> Result<Vec<JobRecord>, StoreError> {
        let text = read_text(path).await?;
        let records = self.decode(&text)?;
        debug!(path = %path.display(), count = records.len(), "Decoded saved records");
        Ok(records)
    }
}

/// JSON array of record objects.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSource;

#[async_trait]
impl RecordSource for JsonSource {
    fn extension(&self) -> &'static str {
        "json"
    }

    fn decode(&self, text: &str) -> Result<Vec<JobRecord>, StoreError> {
        Ok(JobRecord::list_from_json(text)?)
    }
}

/// CSV with a header row.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvSource;

#[async_trait]
impl RecordSource for CsvSource {
    fn extension(&self) -> &'static str {
        "csv"
    }

    fn decode(&self, text: &str) -> Result<Vec<JobRecord>, StoreError> {
        decode_csv(text)
    }
}

/// Picks the source for `path` by its extension, case-insensitively.
///
/// # Errors
///
/// Returns [`StoreError::UnsupportedFormat`] for anything but `.json` and
/// `.csv`.
pub fn source_for(path: &Path) -> Result<Box<dyn RecordSource>, StoreError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match extension.as_str() {
        "json" => Ok(Box::new(JsonSource)),
        "csv" => Ok(Box::new(CsvSource)),
        _ => Err(StoreError::UnsupportedFormat(path.display().to_string())),
    }
}

/// Loads saved records from `path`, choosing the decoder by extension.
#[instrument(skip_all, fields(path = %path.display()))]
pub async fn load_records(path: &Path) -> Result<Vec<JobRecord>, StoreError> {
    let source = source_for(path)?;
    source.load(path).await
}
