//! Environment configuration.
//!
//! Values come from the process environment, optionally seeded from a
//! `.env` file. Missing, unparsable or zero numeric values fall back to
//! their defaults.

use std::path::PathBuf;
use std::time::Duration;

use jobharvest_fetch::FetchSettings;
use jobharvest_fetch::context::{DEFAULT_BASE_URL, DEFAULT_KEYWORD};
use jobharvest_fetch::host::http::DEFAULT_USER_AGENT;
use tracing::debug;

use crate::error::StoreError;

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

const DEFAULT_PAGE_DELAY_MS: u64 = 2000;
const DEFAULT_MAX_CONCURRENCY: usize = 3;
const DEFAULT_CHUNK_SIZE: usize = 5;
const DEFAULT_MAX_PAGES: u32 = 5;

/// Run configuration derived from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestConfig {
    /// Listing search URL (`BASE_URL`).
    pub base_url: String,
    /// Output directory (`DATA_DIR`).
    pub data_dir: PathBuf,
    /// HTTP user agent (`USER_AGENT`).
    pub user_agent: String,
    /// Pause between listing pages (`PAGE_DELAY_MS`).
    pub page_delay: Duration,
    /// Parallelism hint (`MAX_CONCURRENCY`). Fetching is sequential, so
    /// this is carried but not acted on.
    pub max_concurrency: usize,
    /// Detail records per confirmation chunk (`CHUNK_SIZE`).
    pub chunk_size: usize,
    /// Highest listing page (`MAX_PAGES`).
    pub max_pages: u32,
    /// Keyword used when none is given (`DEFAULT_KEYWORD`).
    pub default_keyword: String,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            data_dir: default_data_dir(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            page_delay: Duration::from_millis(DEFAULT_PAGE_DELAY_MS),
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_pages: DEFAULT_MAX_PAGES,
            default_keyword: DEFAULT_KEYWORD.to_string(),
        }
    }
}

/// Parses a positive number, treating zero and garbage as absent.
fn positive<T>(value: Option<String>) -> Option<T>
where
    T: std::str::FromStr + PartialEq + Default,
{
    value
        .and_then(|v| v.trim().parse::<T>().ok())
        .filter(|v| *v != T::default())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl HarvestConfig {
    /// Loads `.env` if present, then reads the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Config`] if a `.env` file exists but cannot be
    /// parsed.
    pub fn from_env() -> Result<Self, StoreError> {
        match dotenvy::dotenv() {
            Ok(path) => debug!(path = %path.display(), "Loaded .env file"),
            Err(e) if e.not_found() => debug!("No .env file"),
            Err(e) => return Err(StoreError::Config(e.to_string())),
        }
        Ok(Self::from_lookup(|key| std::env::var(key).ok()))
    }

    /// Builds the config from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            base_url: non_empty(lookup("BASE_URL")).unwrap_or(defaults.base_url),
            data_dir: non_empty(lookup("DATA_DIR")).map_or(defaults.data_dir, PathBuf::from),
            user_agent: non_empty(lookup("USER_AGENT")).unwrap_or(defaults.user_agent),
            page_delay: positive(lookup("PAGE_DELAY_MS"))
                .map_or(defaults.page_delay, Duration::from_millis),
            max_concurrency: positive(lookup("MAX_CONCURRENCY"))
                .unwrap_or(defaults.max_concurrency),
            chunk_size: positive(lookup("CHUNK_SIZE")).unwrap_or(defaults.chunk_size),
            max_pages: positive(lookup("MAX_PAGES")).unwrap_or(defaults.max_pages),
            default_keyword: non_empty(lookup("DEFAULT_KEYWORD"))
                .unwrap_or(defaults.default_keyword),
        }
    }

    /// Derives fetch settings. Per-run values (keyword, start page, cap)
    /// are set by the caller afterwards.
    pub fn to_fetch_settings(&self) -> FetchSettings {
        FetchSettings {
            base_url: self.base_url.clone(),
            keyword: self.default_keyword.clone(),
            max_pages: self.max_pages,
            page_delay: self.page_delay,
            chunk_size: self.chunk_size,
            ..FetchSettings::default()
        }
    }
}
