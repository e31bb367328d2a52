//! Job record types.
//!
//! A [`JobRecord`] is created from a [`JobSummary`] during the listing phase
//! and later enriched in place with a [`JobDetails`]. Records are never
//! removed; a failed enrichment is kept with its `error` set.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ============================================================================
// Job Summary
// ============================================================================

/// Fields read from one card on a listing page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSummary {
    /// Job title. Cards with a blank title are dropped before this is built.
    pub title: String,
    /// Short description shown on the card.
    pub description: String,
    /// Budget text with thousands separators removed.
    pub budget: String,
    /// Remaining application period.
    pub period: String,
    /// Client display name.
    pub client: String,
    /// Applicant count shown on the card.
    pub applicants: u32,
    /// Absolute link to the detail page.
    pub link: String,
}

// ============================================================================
// Job Details
// ============================================================================

/// Fields read from a job detail page.
///
/// Every field is optional: a missing element on the page yields `None`
/// rather than an error.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobDetails {
    /// Long-form description.
    pub detail_description: Option<String>,
    /// Number of applicants.
    pub applicants_count: Option<u32>,
    /// Number of contracted workers.
    pub contracted_count: Option<u32>,
    /// Number of workers wanted.
    pub required_count: Option<u32>,
    /// Application deadline text.
    pub application_deadline: Option<String>,
    /// Client legal name.
    pub client_name: Option<String>,
    /// Client average rating.
    pub client_rating: Option<f64>,
    /// Number of reviews the client has received.
    pub client_review_count: Option<u32>,
    /// False when the "identity not verified" marker is present.
    pub client_identity_verified: Option<bool>,
    /// False when the "rule check not answered" marker is present.
    pub client_rule_check_succeeded: Option<bool>,
}

// ============================================================================
// Job Record
// ============================================================================

/// One listing entry, uniquely identified by `link`.
///
/// Field names serialize in camelCase so that output files written by
/// earlier runs load unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRecord {
    /// Job title.
    #[serde(default)]
    pub title: String,
    /// Short description from the listing card.
    #[serde(default)]
    pub description: String,
    /// Budget text.
    #[serde(default)]
    pub budget: String,
    /// Remaining application period.
    #[serde(default)]
    pub period: String,
    /// Client display name.
    #[serde(default)]
    pub client: String,
    /// Applicant count from the listing card.
    #[serde(default)]
    pub applicants: u32,
    /// Canonical link, stable across runs.
    #[serde(default)]
    pub link: String,

    /// Long-form description from the detail page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail_description: Option<String>,
    /// Applicant count from the detail page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applicants_count: Option<u32>,
    /// Contracted count.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contracted_count: Option<u32>,
    /// Required headcount.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_count: Option<u32>,
    /// Application deadline.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_deadline: Option<String>,
    /// Client legal name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_name: Option<String>,
    /// Client rating.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_rating: Option<f64>,
    /// Client review count.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_review_count: Option<u32>,
    /// Client identity verification flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_identity_verified: Option<bool>,
    /// Client rule-check flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_rule_check_succeeded: Option<bool>,

    /// Terminal enrichment failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<JobSummary> for JobRecord {
    fn from(summary: JobSummary) -> Self {
        Self {
            title: summary.title,
            description: summary.description,
            budget: summary.budget,
            period: summary.period,
            client: summary.client,
            applicants: summary.applicants,
            link: summary.link,
            ..Self::default()
        }
    }
}

impl JobRecord {
    /// Decodes a JSON array of records.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Serialization` if the input is not an array of
    /// record objects.
    pub fn list_from_json(json: &str) -> Result<Vec<Self>, CoreError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Returns true once enrichment has either produced a detail
    /// description or recorded a terminal error.
    pub fn is_resolved(&self) -> bool {
        self.detail_description.is_some() || self.error.is_some()
    }

    /// Overlays extracted detail fields onto this record.
    ///
    /// Only fields that were extracted are written; an existing value is
    /// never cleared by a `None`.
    pub fn apply_details(&mut self, details: JobDetails) {
        fn overlay<T>(slot: &mut Option<T>, value: Option<T>) {
            if value.is_some() {
                *slot = value;
            }
        }

        overlay(&mut self.detail_description, details.detail_description);
        overlay(&mut self.applicants_count, details.applicants_count);
        overlay(&mut self.contracted_count, details.contracted_count);
        overlay(&mut self.required_count, details.required_count);
        overlay(&mut self.application_deadline, details.application_deadline);
        overlay(&mut self.client_name, details.client_name);
        overlay(&mut self.client_rating, details.client_rating);
        overlay(&mut self.client_review_count, details.client_review_count);
        overlay(
            &mut self.client_identity_verified,
            details.client_identity_verified,
        );
        overlay(
            &mut self.client_rule_check_succeeded,
            details.client_rule_check_succeeded,
        );
    }

    /// Records a terminal enrichment failure.
    pub fn mark_failed(&mut self, reason: impl Into<String>) {
        self.error = Some(reason.into());
    }

    /// Validates numeric fields.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidData` if the client rating is negative or
    /// not a finite number.
    pub fn validate(&self) -> Result<(), CoreError> {
        if let Some(rating) = self.client_rating {
            if !rating.is_finite() || rating < 0.0 {
                return Err(CoreError::InvalidData(format!(
                    "clientRating {rating} is not a non-negative number"
                )));
            }
        }
        Ok(())
    }

    /// Drops values that fail [`validate`](Self::validate).
    pub fn sanitize(&mut self) {
        if self.client_rating.is_some_and(|r| !r.is_finite() || r < 0.0) {
            self.client_rating = None;
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
