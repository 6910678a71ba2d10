mod common;

use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use sentiview_client::{AggregateRefresher, ApiError, ApiErrorKind, EditController, QueryManager};
use sentiview_core::{MergeOutcome, ResultUpdate, ScoreOverride};

use common::{init_logging, record, FakeApi};

struct Fixture {
    api: Arc<FakeApi>,
    results: Arc<QueryManager>,
    aggregates: AggregateRefresher,
    edits: EditController,
}

async fn fixture() -> Fixture {
    init_logging();
    let api = Arc::new(FakeApi::new(1).with_rows((1..=5).map(|id| record(id, 0.2)).collect()));
    let results = Arc::new(QueryManager::new(api.clone(), 1, Duration::from_millis(300)));
    results.refresh();
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(results.view().results.results.len(), 5);

    let aggregates = AggregateRefresher::new(api.clone(), 1);
    let edits = EditController::new(api.clone(), results.clone(), aggregates.clone());
    Fixture {
        api,
        results,
        aggregates,
        edits,
    }
}

#[tokio::test(start_paused = true)]
async fn confirmed_override_merges_in_place() {
    let f = fixture().await;
    f.api.set_summary_total(5);
    let mut rx = f.results.subscribe();
    rx.borrow_and_update();

    assert!(f.edits.begin_edit(3));
    f.edits.set_draft(0.9, "clearly sarcastic");
    // The backend only answers with a message.
    f.api.answer_updates_with(Ok(ResultUpdate::default()));

    let outcome = f
        .edits
        .commit_edit(3, 0.9, "clearly sarcastic")
        .await
        .expect("commit");
    assert_eq!(outcome, MergeOutcome::Merged { index: 2 });
    assert!(rx.has_changed().unwrap());
    assert_eq!(f.edits.current(), None);

    let view = f.results.view();
    let ids: Vec<_> = view.results.results.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    let row = &view.results.results[2];
    assert_eq!(row.score, 0.9);
    assert_eq!(row.override_reason.as_deref(), Some("clearly sarcastic"));
    assert_eq!(view.results.results[1].score, 0.2);

    assert_eq!(
        f.api.update_calls.lock().unwrap().clone(),
        vec![(
            3,
            ScoreOverride {
                manual_sentiment: 0.9,
                override_reason: "clearly sarcastic".into(),
            }
        )]
    );

    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(f.api.summary_calls(), 1);
    assert_eq!(
        f.aggregates.latest().map(|a| a.summary.total_posts),
        Some(5)
    );
}

#[tokio::test(start_paused = true)]
async fn server_echo_wins_over_committed_values() {
    let f = fixture().await;
    f.api.answer_updates_with(Ok(ResultUpdate {
        score: Some(-0.25),
        override_reason: Some("normalised".into()),
        ..ResultUpdate::default()
    }));

    f.edits.begin_edit(1);
    let outcome = f.edits.commit_edit(1, -0.3, "typed").await.expect("commit");

    assert_eq!(outcome, MergeOutcome::Merged { index: 0 });
    let row = f.results.view().results.results[0].clone();
    assert_eq!(row.score, -0.25);
    assert_eq!(row.override_reason.as_deref(), Some("normalised"));
}

#[tokio::test(start_paused = true)]
async fn record_not_on_page_is_a_no_op() {
    let f = fixture().await;
    let before = f.results.view();
    let mut rx = f.results.subscribe();
    rx.borrow_and_update();

    assert!(!f.edits.begin_edit(99));
    let outcome = f.edits.commit_edit(99, -0.5, "gone").await.expect("commit");

    assert_eq!(outcome, MergeOutcome::NotDisplayed);
    assert!(!rx.has_changed().unwrap());
    assert_eq!(f.results.view(), before);
}

#[tokio::test(start_paused = true)]
async fn rejected_override_keeps_the_draft_open() {
    let f = fixture().await;
    f.api.answer_updates_with(Err(ApiError::from_status(
        400,
        Some("Score must be between -1 and 1".into()),
    )));

    assert!(f.edits.begin_edit(2));
    let err = f
        .edits
        .commit_edit(2, 1.5, "too happy")
        .await
        .expect_err("rejected");
    assert_eq!(err.kind, ApiErrorKind::Validation);

    let session = f.edits.current().expect("edit still open");
    assert_eq!(session.record_id, 2);
    assert_eq!(session.draft_score, 1.0);
    assert_eq!(session.reason, "too happy");
    assert!(!session.pending);
    assert_eq!(
        session.error.as_deref(),
        Some("Score must be between -1 and 1")
    );
    assert_eq!(f.results.view().results.results[1].score, 0.2);

    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(f.api.summary_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn cancel_edit_discards_the_draft() {
    let f = fixture().await;
    f.edits.begin_edit(4);
    f.edits.set_draft(-2.0, "nope");
    assert_eq!(f.edits.current().map(|s| s.draft_score), Some(-1.0));

    let cancelled = f.edits.cancel_edit().expect("open edit");
    assert_eq!(cancelled.original.score, 0.2);
    assert_eq!(f.edits.current(), None);
}
