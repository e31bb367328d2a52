//! Field extraction from listing and detail pages.
//!
//! Every lookup is independent: a selector that matches nothing yields an
//! absent value and never prevents the other fields from being read.

use std::sync::LazyLock;

use jobharvest_core::{JobDetails, JobSummary};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;
use url::Url;

use crate::error::FetchError;

// ============================================================================
// Selectors
// ============================================================================

/// One job card on a listing page.
pub const LISTING_CARD: &str = "div.UNzN7";

/// Pagination link present when another listing page exists.
pub const NEXT_PAGE: &str = r#"a[rel="next"]"#;

/// Header block that marks a rendered detail page.
pub const DETAIL_READY: &str = "section.job_offer_detail_header";

const CARD_TITLE: &str = "div.FY2t2 div.WkZ08 h3 a";
const CARD_DESCRIPTION: &str = "div.irB0G, div.Mm0nv";
const CARD_CLIENT: &str = "div.rGkuO a.uxHdW";
const CARD_BUDGET: &str = "span.lCkhZ, span.Yh37y";
const CARD_APPLICANTS: &str = "b.D0ZNl";
const CARD_PERIOD: &str = "b.GQEZv";

const DETAIL_DESCRIPTION: &str = "section.detail_information td.confirm_outside_link";
const DETAIL_APPLICANTS: &str = "section.application_status table tr:nth-child(1) td";
const DETAIL_CONTRACTED: &str = "section.application_status table tr:nth-child(2) td";
const DETAIL_REQUIRED: &str = "section.application_status table tr:nth-child(3) td";
const DETAIL_SUMMARY_HEADER: &str = "table.summary th";
const DEADLINE_LABEL: &str = "応募期限";
const CLIENT_NAME: &str = r#"section.client_detail_information a[href^="/public/employers/"]"#;
const CLIENT_RATING: &str = "section.client_detail_information span.average-score";
const CLIENT_REVIEWS: &str =
    "section.client_detail_information .client_rating span.feedback_summary";
const IDENTITY_NOT_VERIFIED: &str =
    "section.client_detail_information span.not-identity_verified";
const RULE_CHECK_NOT_ANSWERED: &str =
    "section.client_detail_information span.not-employer_rule_check_succeeded";

/// Words stripped from the remaining-period badge ("あと3日" -> "3").
const PERIOD_NOISE: [&str; 3] = ["あと", "日", "時間"];

static INTEGER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+").expect("Invalid regex"));

static DECIMAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+\.\d+").expect("Invalid regex"));

// ============================================================================
// Text Helpers
// ============================================================================

/// Parses the first run of digits in `text`.
pub fn first_integer(text: &str) -> Option<u32> {
    INTEGER_RE.find(text).and_then(|m| m.as_str().parse().ok())
}

/// Parses the first decimal number (digits, dot, digits) in `text`.
pub fn first_decimal(text: &str) -> Option<f64> {
    DECIMAL_RE.find(text).and_then(|m| m.as_str().parse().ok())
}

/// Keeps only ASCII digits; an empty result counts as zero.
fn digits_only(text: &str) -> u32 {
    let digits: String = text.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        0
    } else {
        digits.parse().unwrap_or(u32::MAX)
    }
}

fn selector(css: &str) -> Result<Selector, FetchError> {
    Selector::parse(css).map_err(|e| FetchError::InvalidSelector(format!("{css}: {e}")))
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Text of the first element under `scope` matching `css`, trimmed.
fn first_text(scope: ElementRef<'_>, css: &str) -> Option<String> {
    let sel = selector(css).ok()?;
    scope.select(&sel).next().map(element_text)
}

/// Like [`first_text`], but blank text counts as absent.
fn non_blank_text(scope: ElementRef<'_>, css: &str, field: &str) -> Option<String> {
    match first_text(scope, css) {
        Some(text) if !text.is_empty() => Some(text),
        _ => {
            debug!(field, selector = css, "Detail element not found");
            None
        }
    }
}

fn exists(scope: ElementRef<'_>, css: &str) -> bool {
    selector(css).is_ok_and(|sel| scope.select(&sel).next().is_some())
}

/// Returns true if `selector` matches anything in `html`.
///
/// # Errors
///
/// Returns [`FetchError::InvalidSelector`] if `css` does not parse.
pub fn document_matches(html: &str, css: &str) -> Result<bool, FetchError> {
    let sel = selector(css)?;
    let document = Html::parse_document(html);
    Ok(document.select(&sel).next().is_some())
}

// ============================================================================
// Listing Pages
// ============================================================================

/// Jobs extracted from one listing page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingPage {
    /// Cards in document order, blank titles excluded.
    pub jobs: Vec<JobSummary>,
    /// Whether the page offers a next-page link.
    pub has_next: bool,
}

/// Extracts job summaries from a listing page.
///
/// Relative links are resolved against `page_url`.
pub fn parse_listing(html: &str, page_url: &Url) -> ListingPage {
    let document = Html::parse_document(html);
    let root = document.root_element();

    let jobs = match selector(LISTING_CARD) {
        Ok(card_sel) => document
            .select(&card_sel)
            .filter_map(|card| parse_card(card, page_url))
            .collect(),
        Err(_) => Vec::new(),
    };

    ListingPage {
        jobs,
        has_next: exists(root, NEXT_PAGE),
    }
}

fn parse_card(card: ElementRef<'_>, page_url: &Url) -> Option<JobSummary> {
    let anchor = selector(CARD_TITLE)
        .ok()
        .and_then(|sel| card.select(&sel).next());

    let title = anchor.map(element_text).unwrap_or_default();
    if title.is_empty() {
        debug!("Skipping listing card without a title");
        return None;
    }

    let link = anchor
        .and_then(|a| a.value().attr("href"))
        .and_then(|href| page_url.join(href).ok())
        .map(String::from)
        .unwrap_or_default();

    let budget = first_text(card, CARD_BUDGET)
        .unwrap_or_default()
        .replace(',', "");

    let applicants = first_text(card, CARD_APPLICANTS).map_or(0, |text| digits_only(&text));

    let mut period = first_text(card, CARD_PERIOD).unwrap_or_default();
    for noise in PERIOD_NOISE {
        period = period.replace(noise, "");
    }

    Some(JobSummary {
        title,
        description: first_text(card, CARD_DESCRIPTION).unwrap_or_default(),
        budget: budget.trim().to_string(),
        period: period.trim().to_string(),
        client: first_text(card, CARD_CLIENT).unwrap_or_default(),
        applicants,
        link,
    })
}

// ============================================================================
// Detail Pages
// ============================================================================

/// Extracts detail fields from a job detail page.
pub fn parse_details(html: &str) -> JobDetails {
    let document = Html::parse_document(html);
    let root = document.root_element();

    let count = |css: &str, field: &str| {
        non_blank_text(root, css, field).and_then(|text| first_integer(&text))
    };

    let client_review_count = if exists(root, CLIENT_REVIEWS) {
        count(CLIENT_REVIEWS, "clientReviewCount")
    } else {
        debug!(selector = CLIENT_REVIEWS, "Review count element not found");
        None
    };

    JobDetails {
        detail_description: non_blank_text(root, DETAIL_DESCRIPTION, "detailDescription"),
        applicants_count: count(DETAIL_APPLICANTS, "applicantsCount"),
        contracted_count: count(DETAIL_CONTRACTED, "contractedCount"),
        required_count: count(DETAIL_REQUIRED, "requiredCount"),
        application_deadline: deadline(root),
        client_name: non_blank_text(root, CLIENT_NAME, "clientName"),
        client_rating: non_blank_text(root, CLIENT_RATING, "clientRating")
            .and_then(|text| first_decimal(&text)),
        client_review_count,
        client_identity_verified: Some(!exists(root, IDENTITY_NOT_VERIFIED)),
        client_rule_check_succeeded: Some(!exists(root, RULE_CHECK_NOT_ANSWERED)),
    }
}

/// Finds the summary-table header carrying the deadline label and reads the
/// cell that follows it.
fn deadline(root: ElementRef<'_>) -> Option<String> {
    let header_sel = selector(DETAIL_SUMMARY_HEADER).ok()?;
    let value = root
        .select(&header_sel)
        .find(|th| element_text(*th).contains(DEADLINE_LABEL))
        .and_then(|th| {
            th.next_siblings()
                .filter_map(ElementRef::wrap)
                .find(|sibling| sibling.value().name() == "td")
        })
        .map(element_text)
        .filter(|text| !text.is_empty());

    if value.is_none() {
        debug!(field = "applicationDeadline", "Detail element not found");
    }
    value
}

// ============================================================================
// Tests
// ============================================================================
