use crate::{JobId, JobStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PollPhase {
    #[default]
    Idle,
    Polling,
    Completed,
    /// The job failed on the server, or a poll request errored.
    Failed,
    Cancelled,
}

impl PollPhase {
    pub fn is_finished(self) -> bool {
        matches!(
            self,
            PollPhase::Completed | PollPhase::Failed | PollPhase::Cancelled
        )
    }
}

/// What the driver must do after feeding a status into the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollStep {
    /// Job still running; schedule the next poll.
    Continue,
    Completed,
    Failed,
    /// The session is no longer polling; drop the response.
    Ignored,
}

/// Client-side view of one job being watched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSession {
    pub job_id: JobId,
    pub status: JobStatus,
    pub poll_count: u32,
    pub phase: PollPhase,
}

impl JobSession {
    pub fn new(job_id: JobId) -> Self {
        Self {
            job_id,
            status: JobStatus::Pending,
            poll_count: 0,
            phase: PollPhase::Idle,
        }
    }

    /// Returns false when the session was already started.
    pub fn start(&mut self) -> bool {
        if self.phase != PollPhase::Idle {
            return false;
        }
        self.phase = PollPhase::Polling;
        true
    }

    /// Capability check for deferred work: only an active session may
    /// mutate shared state.
    pub fn is_active(&self) -> bool {
        self.phase == PollPhase::Polling
    }

    pub fn observe(&mut self, status: JobStatus) -> PollStep {
        if !self.is_active() {
            return PollStep::Ignored;
        }
        self.status = status;
        match status {
            JobStatus::Pending | JobStatus::Processing => {
                self.poll_count += 1;
                PollStep::Continue
            }
            JobStatus::Completed => {
                self.phase = PollPhase::Completed;
                PollStep::Completed
            }
            JobStatus::Failed => {
                self.phase = PollPhase::Failed;
                PollStep::Failed
            }
        }
    }

    /// A poll request failed. Returns false if the session had already stopped.
    pub fn halt_on_error(&mut self) -> bool {
        if !self.is_active() {
            return false;
        }
        self.phase = PollPhase::Failed;
        true
    }

    /// Moves to `Cancelled` from any phase. Returns true only when this call
    /// stopped an active poll.
    pub fn cancel(&mut self) -> bool {
        let was_active = self.is_active();
        self.phase = PollPhase::Cancelled;
        was_active
    }
}
