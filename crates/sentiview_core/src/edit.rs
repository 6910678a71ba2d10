use crate::{ResultId, ResultRecord, ResultUpdate, ScoreOverride, SearchResultSet};

/// The single open edit, bound to one record.
#[derive(Debug, Clone, PartialEq)]
pub struct EditSession {
    pub record_id: ResultId,
    /// Record as it was when the edit opened.
    pub original: ResultRecord,
    pub draft_score: f64,
    pub reason: String,
    /// A commit is in flight; the view shows a pending state.
    pub pending: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    Merged { index: usize },
    /// The record is not on the displayed page; nothing to merge.
    NotDisplayed,
}

/// Confirmed-write edit state: displayed rows change only after the
/// server has accepted the patch.
#[derive(Debug, Clone, Default)]
pub struct EditReconciler {
    current: Option<EditSession>,
}

impl EditReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open an edit for `record`, discarding any edit already open.
    pub fn begin_edit(&mut self, record: &ResultRecord) -> Option<EditSession> {
        self.current.replace(EditSession {
            record_id: record.id,
            original: record.clone(),
            draft_score: clamp_score(record.score),
            reason: String::new(),
            pending: false,
            error: None,
        })
    }

    pub fn set_draft(&mut self, score: f64, reason: impl Into<String>) {
        if let Some(session) = self.current.as_mut() {
            session.draft_score = clamp_score(score);
            session.reason = reason.into();
        }
    }

    pub fn cancel_edit(&mut self) -> Option<EditSession> {
        self.current.take()
    }

    pub fn current(&self) -> Option<&EditSession> {
        self.current.as_ref()
    }

    /// Build the patch body and mark the matching edit as pending.
    pub fn begin_commit(
        &mut self,
        record_id: ResultId,
        score: f64,
        reason: &str,
    ) -> ScoreOverride {
        let body = ScoreOverride {
            manual_sentiment: clamp_score(score),
            override_reason: reason.to_string(),
        };
        if let Some(session) = self.session_for(record_id) {
            session.draft_score = body.manual_sentiment;
            session.reason = body.override_reason.clone();
            session.pending = true;
            session.error = None;
        }
        body
    }

    /// Apply a server-confirmed patch to the displayed page and close the edit.
    ///
    /// Fields the server did not echo back fall back to what was committed.
    pub fn confirm(
        &mut self,
        record_id: ResultId,
        committed: &ScoreOverride,
        mut confirmed: ResultUpdate,
        view: &mut SearchResultSet,
    ) -> MergeOutcome {
        if confirmed.score.is_none() {
            confirmed.score = Some(committed.manual_sentiment);
        }
        if confirmed.override_reason.is_none() {
            confirmed.override_reason = Some(committed.override_reason.clone());
        }
        if self.session_for(record_id).is_some() {
            self.current = None;
        }
        match view.merge_in_place(record_id, &confirmed) {
            Some(index) => MergeOutcome::Merged { index },
            None => MergeOutcome::NotDisplayed,
        }
    }

    /// Keep the edit open with the user's draft and record the failure.
    pub fn reject(&mut self, record_id: ResultId, message: impl Into<String>) {
        if let Some(session) = self.session_for(record_id) {
            session.pending = false;
            session.error = Some(message.into());
        }
    }

    fn session_for(&mut self, record_id: ResultId) -> Option<&mut EditSession> {
        self.current
            .as_mut()
            .filter(|session| session.record_id == record_id)
    }
}

pub fn clamp_score(score: f64) -> f64 {
    if score.is_nan() {
        0.0
    } else {
        score.clamp(-1.0, 1.0)
    }
}
