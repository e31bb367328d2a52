//! File persistence helpers.
//!
//! Output files are written to a sibling temp file and renamed into place,
//! so an interrupted write never leaves a truncated result behind.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::debug;

use crate::error::StoreError;

/// Creates `path` and its parents if missing.
pub async fn ensure_dir(path: &Path) -> Result<(), StoreError> {
    if !tokio::fs::try_exists(path).await? {
        debug!(path = %path.display(), "Creating directory");
        tokio::fs::create_dir_all(path).await?;
    }
    Ok(())
}

/// Temp path used while writing `path`.
fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Writes `contents` to `path` atomically (temp file + rename).
///
/// Parent directories are created if they don't exist.
pub async fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), StoreError> {
    debug!(path = %path.display(), bytes = contents.len(), "Writing file");

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        ensure_dir(parent).await?;
    }

    let temp = temp_path(path);
    tokio::fs::write(&temp, contents).await?;
    if let Err(e) = tokio::fs::rename(&temp, path).await {
        let _ = tokio::fs::remove_file(&temp).await;
        return Err(e.into());
    }

    debug!(path = %path.display(), "File written");
    Ok(())
}

/// Saves `data` as pretty-printed JSON.
pub async fn save_json<T: Serialize + ?Sized>(path: &Path, data: &T) -> Result<(), StoreError> {
    let json = serde_json::to_string_pretty(data)?;
    write_atomic(path, json.as_bytes()).await
}

/// Reads a UTF-8 text file, mapping a missing file to
/// [`StoreError::NotFound`].
pub async fn read_text(path: &Path) -> Result<String, StoreError> {
    match tokio::fs::read_to_string(path).await {
        Ok(text) => Ok(text),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(StoreError::NotFound(path.to_path_buf()))
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temp_path_keeps_extension() {
        let path = Path::new("/data/scraped.csv");
        assert_eq!(temp_path(path), PathBuf::from("/data/scraped.csv.tmp"));
    }

    #[tokio::test]
    async fn test_read_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.json");
        assert!(matches!(
            read_text(&missing).await,
            Err(StoreError::NotFound(p)) if p == missing
        ));
    }
}
