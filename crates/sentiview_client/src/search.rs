//! Debounced, sequence-checked search for one job's results.
//!
//! Every submission is stamped with a [`SequenceNumber`] when it is made.
//! Filter edits wait for a quiet window before a request goes out; page
//! turns go out at once. A response publishes only if its sequence number
//! is still the highest one issued, so a slow reply to an older query can
//! never overwrite the view of a newer one.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use sentiview_core::{
    JobId, MergeOutcome, SearchFilters, SearchQuery, SearchResultSet, SequenceNumber,
    SequenceTracker, SortBy, SortOrder,
};
use sentiview_logging::{sv_debug, sv_warn};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::{ApiError, JobApi};

/// What the results table renders.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SearchView {
    pub results: SearchResultSet,
    pub loading: bool,
    pub error: Option<ApiError>,
}

struct QueryState {
    tracker: SequenceTracker,
    current: SearchQuery,
    /// Debounce timer of the last filter edit, if it has not fired yet.
    pending: Option<CancellationToken>,
}

struct QueryInner {
    api: Arc<dyn JobApi>,
    job_id: JobId,
    debounce: Duration,
    state: Mutex<QueryState>,
    view: watch::Sender<SearchView>,
    shutdown: CancellationToken,
}

/// Owns the search view of one job. Dropping it stops all pending work.
pub struct QueryManager {
    inner: Arc<QueryInner>,
}

impl QueryManager {
    pub fn new(api: Arc<dyn JobApi>, job_id: JobId, debounce: Duration) -> Self {
        let (view, _) = watch::channel(SearchView::default());
        Self {
            inner: Arc::new(QueryInner {
                api,
                job_id,
                debounce,
                state: Mutex::new(QueryState {
                    tracker: SequenceTracker::new(),
                    current: SearchQuery::default(),
                    pending: None,
                }),
                view,
                shutdown: CancellationToken::new(),
            }),
        }
    }

    pub fn job_id(&self) -> JobId {
        self.inner.job_id
    }

    pub fn subscribe(&self) -> watch::Receiver<SearchView> {
        self.inner.view.subscribe()
    }

    pub fn view(&self) -> SearchView {
        self.inner.view.borrow().clone()
    }

    pub fn current_query(&self) -> SearchQuery {
        self.inner.lock_state().current.clone()
    }

    pub fn highest_issued(&self) -> SequenceNumber {
        self.inner.lock_state().tracker.highest_issued()
    }

    /// Debounced submission: only the last query in a burst reaches the
    /// network. Must be called from within a tokio runtime.
    pub fn submit(&self, query: SearchQuery) -> SequenceNumber {
        let timer = self.inner.shutdown.child_token();
        let seq = self.inner.stamp(query.clone(), Some(timer.clone()));
        let inner = self.inner.clone();
        tokio::spawn(async move {
            // A newer submission may cancel the timer in the same tick the
            // window elapses; the cancellation must win.
            tokio::select! {
                biased;
                _ = timer.cancelled() => {
                    sv_debug!("Search {} coalesced into a newer query", seq);
                    return;
                }
                _ = tokio::time::sleep(inner.debounce) => {}
            }
            inner.execute(seq, query).await;
        });
        seq
    }

    /// Immediate submission, used for explicit page turns.
    pub fn submit_now(&self, query: SearchQuery) -> SequenceNumber {
        let seq = self.inner.stamp(query.clone(), None);
        let inner = self.inner.clone();
        tokio::spawn(async move {
            inner.execute(seq, query).await;
        });
        seq
    }

    pub fn set_filters(&self, filters: SearchFilters) -> SequenceNumber {
        let query = self.current_query().with_filters(filters);
        self.submit(query)
    }

    pub fn set_sort(&self, sort_by: SortBy, sort_order: SortOrder) -> SequenceNumber {
        let query = self.current_query().with_sort(sort_by, sort_order);
        self.submit(query)
    }

    pub fn set_page_size(&self, page_size: u32) -> SequenceNumber {
        let query = self.current_query().with_page_size(page_size);
        self.submit(query)
    }

    pub fn turn_page(&self, page: u32) -> SequenceNumber {
        let query = self.current_query().with_page(page);
        self.submit_now(query)
    }

    /// Re-issue the current query without waiting.
    pub fn refresh(&self) -> SequenceNumber {
        self.submit_now(self.current_query())
    }

    /// Let `f` patch the displayed page; watchers are notified only when a
    /// row actually changed.
    pub fn merge_confirmed(
        &self,
        f: impl FnOnce(&mut SearchResultSet) -> MergeOutcome,
    ) -> MergeOutcome {
        let mut outcome = MergeOutcome::NotDisplayed;
        self.inner.view.send_if_modified(|view| {
            outcome = f(&mut view.results);
            matches!(outcome, MergeOutcome::Merged { .. })
        });
        outcome
    }

    /// Stop pending timers and drop any response still in flight.
    pub fn shutdown(&self) {
        self.inner.shutdown.cancel();
    }
}

impl Drop for QueryManager {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl QueryInner {
    fn lock_state(&self) -> MutexGuard<'_, QueryState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Issue a sequence number and replace the current query. Any debounce
    /// timer still waiting is cancelled and `timer`, if any, takes its place.
    fn stamp(&self, query: SearchQuery, timer: Option<CancellationToken>) -> SequenceNumber {
        let mut state = self.lock_state();
        let seq = state.tracker.issue();
        state.current = query;
        if let Some(previous) = std::mem::replace(&mut state.pending, timer) {
            previous.cancel();
        }
        self.view.send_modify(|view| view.loading = true);
        seq
    }

    async fn execute(&self, seq: SequenceNumber, query: SearchQuery) {
        sv_debug!("Search {} for job {} page {}", seq, self.job_id, query.page);
        let result = tokio::select! {
            _ = self.shutdown.cancelled() => return,
            result = self.api.search(self.job_id, &query) => result,
        };

        // Check and publish under one lock so a newer stamp cannot slip in between.
        let state = self.lock_state();
        if self.shutdown.is_cancelled() {
            return;
        }
        if !state.tracker.is_current(seq) {
            sv_debug!(
                "Discarding stale search {} (latest is {})",
                seq,
                state.tracker.highest_issued()
            );
            return;
        }

        let next = match result {
            Ok(response) => SearchView {
                results: response.into_result_set(&query, seq),
                loading: false,
                error: None,
            },
            Err(err) => {
                sv_warn!("Search {} for job {} failed: {}", seq, self.job_id, err);
                SearchView {
                    results: SearchResultSet::empty(query.page_size, seq),
                    loading: false,
                    error: Some(err),
                }
            }
        };
        self.view.send_replace(next);
        drop(state);
    }
}
