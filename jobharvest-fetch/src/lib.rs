// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # JobHarvest Fetch
//!
//! Page driving and the two collection phases for JobHarvest.
//!
//! ## Page Drivers
//!
//! The [`driver::PageDriver`] trait is the only way the collectors touch a
//! page. Implementations live in [`host`]:
//!
//! - [`host::http`] - Server-rendered pages fetched over HTTP
//! - [`host::memory`] - Scripted in-memory pages
//!
//! ## Phases
//!
//! - [`list::ListCollector`] - Walks listing pages into summary records
//! - [`detail::DetailEnricher`] - Fills in detail fields per record
//! - [`gate::ChunkGate`] - Pauses enrichment between chunks
//! - [`retry::RetryExecutor`] - Bounded retry with linear backoff
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use jobharvest_fetch::{FetchContext, FetchSettings, HttpPageDriver, ListCollector};
//!
//! let driver = Arc::new(HttpPageDriver::new()?);
//! let ctx = FetchContext::new(driver, FetchSettings::default().with_keyword("動画"));
//!
//! let outcome = ListCollector::new(&ctx).collect().await?;
//! println!("{} records", outcome.records.len());
//! ```

// Core modules
pub mod context;
pub mod detail;
pub mod driver;
pub mod error;
pub mod extract;
pub mod gate;
pub mod host;
pub mod list;
pub mod retry;

// Re-export key types at crate root
pub use context::{FetchContext, FetchSettings};
pub use detail::{DetailEnricher, EnrichReport};
pub use driver::PageDriver;
pub use error::FetchError;
pub use extract::{ListingPage, parse_details, parse_listing};
pub use gate::{ChunkGate, Confirmer, DecisionPolicy};
pub use host::{HttpPageDriver, StaticPageDriver};
pub use list::{CollectOutcome, ListCollector, StopReason};
pub use retry::RetryExecutor;

#[cfg(test)]
mod testing;
