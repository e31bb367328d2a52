//! Typed CSV encoding and decoding of job records.
//!
//! CSV cells are untyped text, so every column knows how to render its
//! field and how to parse it back. Empty cells decode to absent values.

use jobharvest_core::JobRecord;
use tracing::debug;

use crate::error::StoreError;

// ============================================================================
// Columns
// ============================================================================

/// A record field as a CSV column, in canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    /// `title`
    Title,
    /// `description`
    Description,
    /// `budget`
    Budget,
    /// `period`
    Period,
    /// `client`
    Client,
    /// `applicants`
    Applicants,
    /// `link`
    Link,
    /// `detailDescription`
    DetailDescription,
    /// `applicantsCount`
    ApplicantsCount,
    /// `contractedCount`
    ContractedCount,
    /// `requiredCount`
    RequiredCount,
    /// `applicationDeadline`
    ApplicationDeadline,
    /// `clientName`
    ClientName,
    /// `clientRating`
    ClientRating,
    /// `clientReviewCount`
    ClientReviewCount,
    /// `clientIdentityVerified`
    ClientIdentityVerified,
    /// `clientRuleCheckSucceeded`
    ClientRuleCheckSucceeded,
    /// `error`
    Error,
}

fn parse_count(cell: &str) -> Option<u32> {
    cell.trim().parse().ok()
}

fn parse_flag(cell: &str) -> Option<bool> {
    let cell = cell.trim();
    if cell.eq_ignore_ascii_case("true") {
        Some(true)
    } else if cell.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

fn text(cell: &str) -> Option<String> {
    Some(cell.to_string())
}

impl Column {
    /// Every column in canonical order.
    pub const ALL: [Column; 18] = [
        Column::Title,
        Column::Description,
        Column::Budget,
        Column::Period,
        Column::Client,
        Column::Applicants,
        Column::Link,
        Column::DetailDescription,
        Column::ApplicantsCount,
        Column::ContractedCount,
        Column::RequiredCount,
        Column::ApplicationDeadline,
        Column::ClientName,
        Column::ClientRating,
        Column::ClientReviewCount,
        Column::ClientIdentityVerified,
        Column::ClientRuleCheckSucceeded,
        Column::Error,
    ];

    /// Header name, identical to the JSON field name.
    pub fn name(self) -> &'static str {
        match self {
            Column::Title => "title",
            Column::Description => "description",
            Column::Budget => "budget",
            Column::Period => "period",
            Column::Client => "client",
            Column::Applicants => "applicants",
            Column::Link => "link",
            Column::DetailDescription => "detailDescription",
            Column::ApplicantsCount => "applicantsCount",
            Column::ContractedCount => "contractedCount",
            Column::RequiredCount => "requiredCount",
            Column::ApplicationDeadline => "applicationDeadline",
            Column::ClientName => "clientName",
            Column::ClientRating => "clientRating",
            Column::ClientReviewCount => "clientReviewCount",
            Column::ClientIdentityVerified => "clientIdentityVerified",
            Column::ClientRuleCheckSucceeded => "clientRuleCheckSucceeded",
            Column::Error => "error",
        }
    }

    /// Looks up a column by header name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.name() == name)
    }

    /// Summary columns are present on every record.
    pub fn is_summary(self) -> bool {
        matches!(
            self,
            Column::Title
                | Column::Description
                | Column::Budget
                | Column::Period
                | Column::Client
                | Column::Applicants
                | Column::Link
        )
    }

    /// Renders the field, or `None` when it is absent.
    pub fn value(self, record: &JobRecord) -> Option<String> {
        match self {
            Column::Title => Some(record.title.clone()),
            Column::Description => Some(record.description.clone()),
            Column::Budget => Some(record.budget.clone()),
            Column::Period => Some(record.period.clone()),
            Column::Client => Some(record.client.clone()),
            Column::Applicants => Some(record.applicants.to_string()),
            Column::Link => Some(record.link.clone()),
            Column::DetailDescription => record.detail_description.clone(),
            Column::ApplicantsCount => record.applicants_count.map(|n| n.to_string()),
            Column::ContractedCount => record.contracted_count.map(|n| n.to_string()),
            Column::RequiredCount => record.required_count.map(|n| n.to_string()),
            Column::ApplicationDeadline => record.application_deadline.clone(),
            Column::ClientName => record.client_name.clone(),
            Column::ClientRating => record.client_rating.map(|r| r.to_string()),
            Column::ClientReviewCount => record.client_review_count.map(|n| n.to_string()),
            Column::ClientIdentityVerified => record.client_identity_verified.map(|b| b.to_string()),
            Column::ClientRuleCheckSucceeded => {
                record.client_rule_check_succeeded.map(|b| b.to_string())
            }
            Column::Error => record.error.clone(),
        }
    }

    /// Parses `cell` into the field. Empty cells leave the field absent.
    ///
    /// Text is stored as written; numbers and flags ignore surrounding
    /// whitespace.
    pub fn assign(self, record: &mut JobRecord, cell: &str) {
        if cell.is_empty() {
            return;
        }

        match self {
            Column::Title => record.title = cell.to_string(),
            Column::Description => record.description = cell.to_string(),
            Column::Budget => record.budget = cell.to_string(),
            Column::Period => record.period = cell.to_string(),
            Column::Client => record.client = cell.to_string(),
            Column::Applicants => record.applicants = parse_count(cell).unwrap_or(0),
            Column::Link => record.link = cell.to_string(),
            Column::DetailDescription => record.detail_description = text(cell),
            Column::ApplicantsCount => record.applicants_count = parse_count(cell),
            Column::ContractedCount => record.contracted_count = parse_count(cell),
            Column::RequiredCount => record.required_count = parse_count(cell),
            Column::ApplicationDeadline => record.application_deadline = text(cell),
            Column::ClientName => record.client_name = text(cell),
            Column::ClientRating => {
                record.client_rating = cell.trim().parse::<f64>().ok().filter(|r| r.is_finite());
            }
            Column::ClientReviewCount => record.client_review_count = parse_count(cell),
            Column::ClientIdentityVerified => record.client_identity_verified = parse_flag(cell),
            Column::ClientRuleCheckSucceeded => {
                record.client_rule_check_succeeded = parse_flag(cell);
            }
            Column::Error => record.error = text(cell),
        }
    }
}

// ============================================================================
// Decoding
// ============================================================================

/// Decodes CSV text with a header row into records.
///
/// Header names are trimmed and unknown columns are ignored. Rows shorter
/// than the header leave the missing fields absent.
pub fn decode_csv(input: &str) -> Result<Vec<JobRecord>, StoreError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(input.as_bytes());

    let columns: Vec<Option<Column>> = reader
        .headers()?
        .iter()
        .map(|name| {
            let name = name.trim_start_matches('\u{feff}').trim();
            let column = Column::from_name(name);
            if column.is_none() {
                debug!(column = name, "Ignoring unknown CSV column");
            }
            column
        })
        .collect();

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        let mut record = JobRecord::default();
        for (column, cell) in columns.iter().zip(row.iter()) {
            if let Some(column) = column {
                column.assign(&mut record, cell);
            }
        }
        records.push(record);
    }

    Ok(records)
}

// ============================================================================
// Encoding
// ============================================================================

/// Columns to write for `records`: every summary column plus each detail
/// column that any record populates, in canonical order.
pub fn columns_for(records: &[JobRecord]) -> Vec<Column> {
    Column::ALL
        .into_iter()
        .filter(|column| {
            column.is_summary() || records.iter().any(|r| column.value(r).is_some())
        })
        .collect()
}

/// Encodes records as CSV with every cell quoted.
pub fn encode_csv(records: &[JobRecord]) -> Result<Vec<u8>, StoreError> {
    let columns = columns_for(records);
    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Always)
        .from_writer(Vec::new());

    writer.write_record(columns.iter().map(|c| c.name()))?;
    for record in records {
        writer.write_record(
            columns
                .iter()
                .map(|c| c.value(record).unwrap_or_default()),
        )?;
    }

    writer
        .into_inner()
        .map_err(|e| StoreError::Io(e.into_error()))
}
