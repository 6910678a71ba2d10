use sentiview_core::{
    EditReconciler, MergeOutcome, ResultRecord, ResultUpdate, SearchResultSet, SequenceNumber,
};

fn record(id: u64, score: f64) -> ResultRecord {
    ResultRecord {
        id,
        content: format!("post {id}"),
        score,
        post_date: None,
        perceived_iq: None,
        bot_probability: None,
        source_type: Some("reddit".to_string()),
        override_reason: None,
    }
}

fn page(ids: &[u64]) -> SearchResultSet {
    let mut set = SearchResultSet::empty(20, SequenceNumber(1));
    set.results = ids.iter().map(|id| record(*id, 0.1)).collect();
    set.total_count = ids.len() as u64;
    set.total_pages = 1;
    set
}

#[test]
fn confirmed_edit_merges_in_place_and_closes() {
    let mut reconciler = EditReconciler::new();
    let mut view = page(&[1, 2, 3]);
    reconciler.begin_edit(&view.results[1]);

    let body = reconciler.begin_commit(2, 0.9, "sarcasm");
    assert!(reconciler.current().unwrap().pending);

    let outcome = reconciler.confirm(2, &body, ResultUpdate::default(), &mut view);
    assert_eq!(outcome, MergeOutcome::Merged { index: 1 });
    assert_eq!(
        view.results.iter().map(|r| r.id).collect::<Vec<_>>(),
        vec![1, 2, 3]
    );
    assert_eq!(view.results[1].score, 0.9);
    assert_eq!(view.results[1].override_reason.as_deref(), Some("sarcasm"));
    assert_eq!(view.results[1].content, "post 2");
    assert!(reconciler.current().is_none());
}

#[test]
fn server_fields_win_over_committed_values() {
    let mut reconciler = EditReconciler::new();
    let mut view = page(&[1]);
    let body = reconciler.begin_commit(1, 0.9, "");
    let confirmed = ResultUpdate {
        score: Some(0.8),
        ..ResultUpdate::default()
    };

    reconciler.confirm(1, &body, confirmed, &mut view);
    assert_eq!(view.results[0].score, 0.8);
}

#[test]
fn record_missing_from_page_is_not_merged() {
    let mut reconciler = EditReconciler::new();
    let mut view = page(&[1, 2]);
    reconciler.begin_edit(&record(42, 0.0));
    let body = reconciler.begin_commit(42, -1.0, "wrong");

    let before = view.clone();
    let outcome = reconciler.confirm(42, &body, ResultUpdate::default(), &mut view);
    assert_eq!(outcome, MergeOutcome::NotDisplayed);
    assert_eq!(view, before);
    assert!(reconciler.current().is_none());
}

#[test]
fn rejected_commit_keeps_draft_open_with_error() {
    let mut reconciler = EditReconciler::new();
    let view = page(&[1]);
    reconciler.begin_edit(&view.results[0]);
    reconciler.begin_commit(1, 0.4, "reason");

    reconciler.reject(1, "Failed to update result");
    let session = reconciler.current().unwrap();
    assert!(!session.pending);
    assert_eq!(session.draft_score, 0.4);
    assert_eq!(session.original.score, 0.1);
    assert_eq!(session.error.as_deref(), Some("Failed to update result"));
}

#[test]
fn new_edit_discards_previous_one() {
    let mut reconciler = EditReconciler::new();
    reconciler.begin_edit(&record(1, 0.0));
    reconciler.set_draft(5.0, "too big");
    assert_eq!(reconciler.current().unwrap().draft_score, 1.0);

    let discarded = reconciler.begin_edit(&record(2, 0.3)).unwrap();
    assert_eq!(discarded.record_id, 1);
    assert_eq!(reconciler.current().unwrap().record_id, 2);
    assert_eq!(reconciler.current().unwrap().reason, "");
}
