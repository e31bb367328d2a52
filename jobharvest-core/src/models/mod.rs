//! Domain models for `JobHarvest`.
//!
//! - [`job`] - Job records and the per-phase extraction products

mod job;

pub use job::{JobDetails, JobRecord, JobSummary};
