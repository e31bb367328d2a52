//! Integration tests for core record types.

use jobharvest_core::{JobDetails, JobRecord, JobSummary};

#[test]
fn test_summary_to_record_to_json() {
    let record = JobRecord::from(JobSummary {
        title: "Title".to_string(),
        link: "https://example.com/jobs/9".to_string(),
        applicants: 2,
        ..JobSummary::default()
    });
    let json = serde_json::to_string(&record).unwrap();
    let parsed: JobRecord = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, record);
    assert!(!parsed.is_resolved());
}

#[test]
fn test_partial_details_keep_summary_fields() {
    let mut record = JobRecord::from(JobSummary {
        title: "Title".to_string(),
        client: "Client".to_string(),
        link: "https://example.com/jobs/9".to_string(),
        ..JobSummary::default()
    });
    record.apply_details(JobDetails {
        client_name: Some("Client Inc".to_string()),
        ..JobDetails::default()
    });

    assert_eq!(record.client, "Client");
    assert_eq!(record.client_name.as_deref(), Some("Client Inc"));
}
