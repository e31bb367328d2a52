// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # JobHarvest Store
//!
//! Run state and persistence for JobHarvest.
//!
//! This crate provides:
//!
//! - **RunState**: The ordered record set of a run, loadable from prior output
//! - **RecordSource**: JSON and CSV decoders for saved records
//! - **ResultSink**: Timestamped JSON + CSV output
//! - **HarvestConfig**: Environment-derived configuration
//!
//! ## Usage
//!
//! ```ignore
//! use jobharvest_store::{FileSink, ResultSink, RunState};
//!
//! let mut state = RunState::load(Path::new("data/scraped-2025-04-01_09-30-00.json")).await?;
//! // ... enrich state.unresolved_mut() ...
//! FileSink::new("data").save(state.records(), state.is_resumed()).await?;
//! ```

pub mod codec;
pub mod config;
pub mod error;
pub mod persistence;
pub mod sink;
pub mod source;
pub mod state;

pub use codec::Column;
pub use config::HarvestConfig;
pub use error::StoreError;
pub use sink::{FileSink, ResultSink, SavedOutput};
pub use source::{CsvSource, JsonSource, RecordSource, load_records};
pub use state::RunState;
