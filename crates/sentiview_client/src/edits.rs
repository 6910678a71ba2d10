use std::sync::{Arc, Mutex, MutexGuard};

use sentiview_core::{EditReconciler, EditSession, JobId, MergeOutcome, ResultId};
use sentiview_logging::{sv_debug, sv_info, sv_warn};

use crate::{AggregateRefresher, ApiError, JobApi, QueryManager};

/// Wires the edit state to the server: a score override reaches the
/// results view only after the patch was accepted, after which the
/// aggregates are refreshed in the background.
pub struct EditController {
    api: Arc<dyn JobApi>,
    job_id: JobId,
    reconciler: Mutex<EditReconciler>,
    results: Arc<QueryManager>,
    aggregates: AggregateRefresher,
}

impl EditController {
    pub fn new(
        api: Arc<dyn JobApi>,
        results: Arc<QueryManager>,
        aggregates: AggregateRefresher,
    ) -> Self {
        Self {
            api,
            job_id: results.job_id(),
            reconciler: Mutex::new(EditReconciler::new()),
            results,
            aggregates,
        }
    }

    /// Open an edit for a row of the displayed page. Returns false when the
    /// row is not shown.
    pub fn begin_edit(&self, record_id: ResultId) -> bool {
        let view = self.results.view();
        let Some(record) = view.results.results.iter().find(|r| r.id == record_id) else {
            sv_debug!("Result {} is not on the displayed page", record_id);
            return false;
        };
        self.lock().begin_edit(record);
        true
    }

    pub fn set_draft(&self, score: f64, reason: impl Into<String>) {
        self.lock().set_draft(score, reason);
    }

    pub fn cancel_edit(&self) -> Option<EditSession> {
        self.lock().cancel_edit()
    }

    pub fn current(&self) -> Option<EditSession> {
        self.lock().current().cloned()
    }

    /// Send the override and merge the confirmed row into the view.
    ///
    /// On failure the edit stays open with the user's draft and the error.
    pub async fn commit_edit(
        &self,
        record_id: ResultId,
        score: f64,
        reason: &str,
    ) -> Result<MergeOutcome, ApiError> {
        let body = self.lock().begin_commit(record_id, score, reason);
        sv_info!(
            "Committing score {} for result {} of job {}",
            body.manual_sentiment,
            record_id,
            self.job_id
        );

        match self.api.update_result(self.job_id, record_id, &body).await {
            Ok(confirmed) => {
                let outcome = self.results.merge_confirmed(|page| {
                    self.lock().confirm(record_id, &body, confirmed, page)
                });
                match outcome {
                    MergeOutcome::Merged { index } => {
                        sv_debug!("Merged result {} at row {}", record_id, index)
                    }
                    MergeOutcome::NotDisplayed => {
                        sv_debug!("Result {} no longer displayed; nothing merged", record_id)
                    }
                }
                self.aggregates.refresh_in_background();
                Ok(outcome)
            }
            Err(err) => {
                sv_warn!("Override of result {} rejected: {}", record_id, err);
                self.lock().reject(record_id, err.user_message());
                Err(err)
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, EditReconciler> {
        self.reconciler.lock().unwrap_or_else(|e| e.into_inner())
    }
}
