//! Save-then-resume round trips through the file sink and run state.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, TimeZone};
use jobharvest_core::JobRecord;
use jobharvest_fetch::{
    ChunkGate, DecisionPolicy, DetailEnricher, FetchContext, FetchSettings, StaticPageDriver,
};
use jobharvest_store::{FileSink, RunState, StoreError};
use tempfile::TempDir;

fn summary(n: u32) -> JobRecord {
    JobRecord {
        title: format!("Job {n}"),
        description: format!("Needs \"editing\", part {n}"),
        budget: "10000円".to_string(),
        period: "5".to_string(),
        client: "Studio".to_string(),
        applicants: n,
        link: format!("https://crowdworks.jp/public/jobs/{n}"),
        ..JobRecord::default()
    }
}

fn resolved(n: u32) -> JobRecord {
    JobRecord {
        detail_description: Some(format!("Full text {n}")),
        applicants_count: Some(n + 10),
        contracted_count: Some(0),
        required_count: Some(1),
        application_deadline: Some("2025年04月20日".to_string()),
        client_name: Some("Studio K".to_string()),
        client_rating: Some(4.75),
        client_review_count: Some(31),
        client_identity_verified: Some(true),
        client_rule_check_succeeded: Some(false),
        ..summary(n)
    }
}

async fn save(dir: &Path, records: &[JobRecord], second: u32) -> (std::path::PathBuf, std::path::PathBuf) {
    let at = Local.with_ymd_and_hms(2025, 4, 1, 12, 0, second).unwrap();
    let saved = FileSink::new(dir)
        .save_at(records, false, at)
        .await
        .unwrap()
        .unwrap();
    (saved.json_path, saved.csv_path)
}

#[tokio::test]
async fn test_csv_round_trip_keeps_types() {
    let dir = TempDir::new().unwrap();
    let mut failed = summary(3);
    failed.mark_failed("Detail scraping failed: timeout");
    let records = vec![resolved(1), summary(2), failed];

    let (_, csv_path) = save(dir.path(), &records, 0).await;
    let state = RunState::load(&csv_path).await.unwrap();

    assert!(state.is_resumed());
    assert_eq!(state.records(), records.as_slice());
}

#[tokio::test]
async fn test_json_round_trip() {
    let dir = TempDir::new().unwrap();
    let records = vec![resolved(1), summary(2)];

    let (json_path, _) = save(dir.path(), &records, 0).await;
    let state = RunState::load(&json_path).await.unwrap();

    assert_eq!(state.records(), records.as_slice());
    assert_eq!(state.resolved_count(), 1);
    assert_eq!(state.unresolved_count(), 1);
}

#[tokio::test]
async fn test_resume_of_complete_output_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let records = vec![resolved(1), resolved(2)];

    let (json_path, _) = save(dir.path(), &records, 0).await;
    let mut state = RunState::load(&json_path).await.unwrap();
    assert_eq!(state.unresolved_mut().count(), 0);

    let (again, _) = save(dir.path(), state.records(), 1).await;
    let reloaded = RunState::load(&again).await.unwrap();
    assert_eq!(reloaded.records(), records.as_slice());
}

#[tokio::test]
async fn test_load_errors() {
    let dir = TempDir::new().unwrap();

    let missing = dir.path().join("missing.json");
    assert!(matches!(
        RunState::load(&missing).await,
        Err(StoreError::NotFound(_))
    ));

    let text = dir.path().join("notes.txt");
    tokio::fs::write(&text, "[]").await.unwrap();
    assert!(matches!(
        RunState::load(&text).await,
        Err(StoreError::UnsupportedFormat(_))
    ));

    let broken = dir.path().join("broken.json");
    tokio::fs::write(&broken, "[{").await.unwrap();
    let err = RunState::load(&broken).await.unwrap_err();
    assert!(err.is_input_error());
}

fn detail_page(description: Option<&str>) -> String {
    let description = description
        .map(|text| {
            format!(
                r#"<section class="detail_information"><table><tr>
                     <td class="confirm_outside_link">{text}</td>
                   </tr></table></section>"#
            )
        })
        .unwrap_or_default();
    format!(
        r#"<html><body>
             <section class="job_offer_detail_header"><h1>Job</h1></section>
             {description}
             <section class="application_status"><table>
               <tr><th>応募</th><td>9 人</td></tr>
             </table></section>
           </body></html>"#
    )
}

async fn enrich(driver: &Arc<StaticPageDriver>, state: &mut RunState) {
    let settings = FetchSettings {
        wait_timeout: Duration::from_millis(10),
        ..FetchSettings::default()
    }
    .without_delays();
    let ctx = FetchContext::new(driver.clone(), settings);
    DetailEnricher::new(&ctx, ChunkGate::new(0, DecisionPolicy::AutoYes))
        .enrich(state.unresolved_mut())
        .await;
}

#[tokio::test]
async fn test_enriched_output_resumes_the_same_from_json_and_csv() {
    let dir = TempDir::new().unwrap();
    let (with_text, without_text) = (summary(1), summary(2));
    let driver = Arc::new(
        StaticPageDriver::new()
            .with_page(with_text.link.clone(), detail_page(Some("Full text")))
            .with_page(without_text.link.clone(), detail_page(None)),
    );

    let mut state = RunState::from_records(vec![with_text, without_text.clone()]);
    enrich(&driver, &mut state).await;
    assert_eq!(state.resolved_count(), 1);
    assert_eq!(state.records()[1].applicants_count, Some(9));

    let (json_path, csv_path) = save(dir.path(), state.records(), 0).await;
    let from_json = RunState::load(&json_path).await.unwrap();
    let from_csv = RunState::load(&csv_path).await.unwrap();

    assert_eq!(from_json.records(), state.records());
    assert_eq!(from_csv.records(), state.records());
    assert_eq!(from_csv.unresolved_count(), from_json.unresolved_count());
    assert_eq!(from_csv.unresolved_count(), 1);

    // Resuming from CSV revisits only the record that is still pending.
    let mut resumed = from_csv;
    enrich(&driver, &mut resumed).await;
    assert_eq!(
        driver.visits(),
        vec![
            summary(1).link,
            without_text.link.clone(),
            without_text.link
        ]
    );
}
