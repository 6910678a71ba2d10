use sentiview_core::{FullDetails, Job, JobStatus, NewJob, ResultRecord, ResultUpdate};

#[test]
fn job_source_accepts_string_or_list() {
    let single: Job = serde_json::from_str(r#"{"id": 1, "source": "reddit,twitter"}"#).unwrap();
    assert_eq!(single.source, vec!["reddit", "twitter"]);

    let list: Job = serde_json::from_str(r#"{"id": 2, "source": ["reddit"]}"#).unwrap();
    assert_eq!(list.source, vec!["reddit"]);

    let missing: Job = serde_json::from_str(r#"{"id": 3, "source": null}"#).unwrap();
    assert!(missing.source.is_empty());
}

#[test]
fn unknown_or_missing_status_means_pending() {
    let unknown: Job = serde_json::from_str(r#"{"id": 1, "status": "queued"}"#).unwrap();
    assert_eq!(unknown.status, None);
    assert_eq!(unknown.effective_status(), JobStatus::Pending);

    let upper: Job = serde_json::from_str(r#"{"id": 1, "status": "COMPLETED"}"#).unwrap();
    assert_eq!(upper.status, Some(JobStatus::Completed));
    assert!(JobStatus::Failed.is_terminal());
    assert!(!JobStatus::Processing.is_terminal());
}

#[test]
fn null_model_outputs_stay_absent() {
    let record: ResultRecord = serde_json::from_str(
        r#"{"id": 5, "content": "hi", "score": 0.2, "perceived_iq": null}"#,
    )
    .unwrap();
    assert_eq!(record.perceived_iq, None);
    assert_eq!(record.bot_probability, None);
    assert_eq!(record.perceived_iq_score(), None);

    let scored: ResultRecord =
        serde_json::from_str(r#"{"id": 6, "perceived_iq": 0.5, "bot_probability": 0.1}"#)
            .unwrap();
    assert_eq!(scored.perceived_iq_score(), Some(100));
}

#[test]
fn result_update_only_touches_sent_fields() {
    let mut record: ResultRecord = serde_json::from_str(
        r#"{"id": 5, "content": "hi", "score": 0.2, "perceived_iq": 0.4}"#,
    )
    .unwrap();
    let update: ResultUpdate = serde_json::from_str(r#"{"score": -0.7}"#).unwrap();
    update.apply_to(&mut record);

    assert_eq!(record.score, -0.7);
    assert_eq!(record.content, "hi");
    assert_eq!(record.perceived_iq, Some(0.4));
}

#[test]
fn message_only_patch_response_parses_as_empty_update() {
    let update: ResultUpdate =
        serde_json::from_str(r#"{"message": "Result updated successfully"}"#).unwrap();
    assert_eq!(update, ResultUpdate::default());
}

#[test]
fn new_job_normalises_models() {
    let job = NewJob::new(
        "rust",
        vec!["reddit".to_string()],
        vec![" Gemma ".to_string(), "VADER".to_string()],
    );
    assert_eq!(job.model, "gemma");
    assert_eq!(job.selected_llms, vec!["gemma", "vader"]);

    let fallback = NewJob::new("rust", vec![], vec![]);
    assert_eq!(fallback.model, NewJob::DEFAULT_MODEL);
}

#[test]
fn full_details_tolerates_empty_job() {
    let raw = r#"{
        "analysis": {"id": 3, "query": "q", "source": ["reddit"], "status": "processing"},
        "summary": null,
        "sentiment_by_date": [],
        "iq_distribution": [],
        "results": []
    }"#;
    let details: FullDetails = serde_json::from_str(raw).unwrap();
    assert_eq!(details.status(), JobStatus::Processing);
    assert!(details.summary.is_none());
    assert!(details.bot_analysis.is_none());
}
