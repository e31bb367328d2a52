// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # `JobHarvest` Core
//!
//! Core types for the `JobHarvest` workspace.
//!
//! This crate provides the record model shared by the fetch, store and CLI
//! crates:
//!
//! - [`JobRecord`] - One listing entry, keyed by its link
//! - [`JobSummary`] - Fields read from a listing page card
//! - [`JobDetails`] - Fields read from a job detail page
//! - [`CoreError`] - Validation errors

pub mod error;
pub mod models;

pub use error::CoreError;

pub use models::{JobDetails, JobRecord, JobSummary};
