// Lint configuration for this crate
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! JobHarvest CLI - collect job listings, then enrich them with detail pages.
//!
//! # Examples
//!
//! ```bash
//! # Collect listings for a keyword and ask before fetching details
//! jobharvest --keyword=動画
//!
//! # Cap the run at 20 records, start on page 3
//! jobharvest --max-jobs=20 --start-page=3
//!
//! # Resume a previous run, enriching only what is still pending
//! jobharvest --input-file=data/scraped-2025-04-01_09-30-00.json --fetch-details
//!
//! # Unattended run
//! jobharvest --skip-chunk-confirm --fetch-details --format json
//! ```

mod harvest;
mod output;
mod prompt;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use jobharvest_fetch::{FetchContext, HttpPageDriver};
use jobharvest_store::{FileSink, HarvestConfig, StoreError};
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use harvest::{Harvest, HarvestOptions};
use output::{OutputFormat, render};
use prompt::StdinConfirmer;

/// Per-request timeout for the HTTP driver.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// ============================================================================
// CLI Definition
// ============================================================================

/// JobHarvest CLI - resumable two-phase job listing harvester.
#[derive(Parser, Debug)]
#[command(name = "jobharvest")]
#[command(about = "Collect job listings and enrich them with detail pages")]
#[command(long_about = r#"
JobHarvest walks a job site's search results, then visits each job's detail
page. Results are saved as JSON and CSV in DATA_DIR. A saved file can be fed
back with --input-file to finish the detail phase later.

Environment (also read from .env):
  BASE_URL, DATA_DIR, USER_AGENT, PAGE_DELAY_MS, MAX_CONCURRENCY,
  CHUNK_SIZE, MAX_PAGES, DEFAULT_KEYWORD, GITHUB_ACTIONS

Examples:
  jobharvest --keyword=動画 --max-jobs=20
  jobharvest --input-file=data/scraped-2025-04-01_09-30-00.csv --fetch-details
"#)]
#[command(version)]
pub struct Cli {
    /// Resume from a saved .json or .csv file instead of collecting listings.
    #[arg(long, value_name = "PATH", value_parser = unquoted_path)]
    pub input_file: Option<PathBuf>,

    /// Maximum records to collect, and to enrich.
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    pub max_jobs: Option<u32>,

    /// Search keyword (defaults to DEFAULT_KEYWORD).
    #[arg(long, value_parser = unquoted)]
    pub keyword: Option<String>,

    /// First listing page to fetch.
    #[arg(long, value_name = "N", default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub start_page: u32,

    /// Continue past every chunk boundary without asking.
    #[arg(long)]
    pub skip_chunk_confirm: bool,

    /// Fetch details without asking.
    #[arg(long, conflicts_with = "no_fetch_details")]
    pub fetch_details: bool,

    /// Skip the detail phase without asking.
    #[arg(long)]
    pub no_fetch_details: bool,

    /// Drop listing records whose link was already collected.
    #[arg(long)]
    pub dedupe: bool,

    /// Summary format (text or json).
    #[arg(long, short = 'f', default_value = "text")]
    pub format: OutputFormat,

    /// Verbose output (show debug info).
    #[arg(long, short)]
    pub verbose: bool,

    /// Quiet mode (no logging).
    #[arg(long, short)]
    pub quiet: bool,
}

impl Cli {
    /// Resolves run options. Unattended runs (CI) always skip chunk
    /// confirmation and always fetch details.
    fn harvest_options(&self, unattended: bool) -> HarvestOptions {
        let fetch_details = if unattended || self.fetch_details {
            Some(true)
        } else if self.no_fetch_details {
            Some(false)
        } else {
            None
        };

        HarvestOptions {
            input_file: self.input_file.clone(),
            max_jobs: self.max_jobs.map(|n| n as usize),
            skip_chunk_confirm: unattended || self.skip_chunk_confirm,
            fetch_details,
            dedupe: self.dedupe,
            unattended,
        }
    }
}

/// Strips one pair of matching surrounding quotes.
fn unquoted(value: &str) -> Result<String, String> {
    let trimmed = value.trim();
    let stripped = ['"', '\'']
        .into_iter()
        .find_map(|q| {
            trimmed
                .strip_prefix(q)
                .and_then(|rest| rest.strip_suffix(q))
        })
        .unwrap_or(trimmed);

    if stripped.is_empty() {
        Err("value must not be empty".to_string())
    } else {
        Ok(stripped.to_string())
    }
}

fn unquoted_path(value: &str) -> Result<PathBuf, String> {
    unquoted(value).map(PathBuf::from)
}

/// CLI exit codes.
#[repr(i32)]
pub enum ExitCode {
    /// General error.
    Error = 1,
    /// The input file is missing, unsupported or malformed.
    InvalidInput = 2,
}

// ============================================================================
// Logging Setup
// ============================================================================

fn setup_logging(verbose: bool, quiet: bool) {
    if quiet {
        return; // No logging in quiet mode
    }

    let default = if verbose {
        "jobharvest=debug,info"
    } else {
        "jobharvest=info,warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

fn is_unattended() -> bool {
    std::env::var("GITHUB_ACTIONS").is_ok_and(|v| v == "true")
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    if let Err(e) = run(&cli).await {
        if !cli.quiet {
            eprintln!("Error: {e:#}");
        }
        let code = match e.downcast_ref::<StoreError>() {
            Some(store) if store.is_input_error() => ExitCode::InvalidInput,
            _ => ExitCode::Error,
        };
        std::process::exit(code as i32);
    }

    Ok(())
}

async fn run(cli: &Cli) -> Result<()> {
    let config = HarvestConfig::from_env()?;
    let unattended = is_unattended();
    if unattended {
        info!("GITHUB_ACTIONS detected, running unattended");
    }
    let options = cli.harvest_options(unattended);
    debug!(?config, ?options, "Resolved configuration");

    let keyword = cli
        .keyword
        .clone()
        .unwrap_or_else(|| config.default_keyword.clone());
    let settings = config
        .to_fetch_settings()
        .with_keyword(keyword)
        .with_start_page(cli.start_page)
        .with_max_jobs(options.max_jobs)
        .with_dedupe(options.dedupe);

    let driver = Arc::new(HttpPageDriver::with_options(
        &config.user_agent,
        REQUEST_TIMEOUT,
    )?);
    let harvest = Harvest::new(
        FetchContext::new(driver, settings),
        Arc::new(FileSink::new(&config.data_dir)),
        Arc::new(StdinConfirmer::new()),
        options,
    );

    let summary = harvest.run().await?;
    println!("{}", render(&summary, cli.format)?);
    Ok(())
}
