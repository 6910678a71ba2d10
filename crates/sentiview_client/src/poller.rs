//! Drives one job from submission to a terminal status.
//!
//! Each [`PollHandle`] owns a background task that fetches the job's full
//! details, feeds the status into a [`JobSession`] and sleeps for the poll
//! interval before the next fetch. The sleep starts only after the previous
//! fetch settled, so two polls for the same job are never in flight at once.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use sentiview_core::{FullDetails, JobId, JobSession, JobStatus, PollStep, ProcessId};
use sentiview_logging::{sv_debug, sv_info, sv_warn};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::{ApiError, JobApi, SharedNotifications};

/// Name shown in the "started"/"completed" notifications.
pub const PROCESS_NAME: &str = "Analysis Processing";

#[derive(Debug, Clone, PartialEq)]
pub enum PollUpdate {
    Progress {
        job_id: JobId,
        status: JobStatus,
        poll_count: u32,
        results_so_far: usize,
    },
    Completed(Box<FullDetails>),
    /// The server reported the job as failed.
    JobFailed(Box<FullDetails>),
    /// A poll request failed; polling has stopped.
    Error(ApiError),
}

pub trait PollSink: Send + Sync {
    fn emit(&self, update: PollUpdate);
}

impl<F> PollSink for F
where
    F: Fn(PollUpdate) + Send + Sync,
{
    fn emit(&self, update: PollUpdate) {
        self(update)
    }
}

pub struct ChannelPollSink {
    tx: mpsc::UnboundedSender<PollUpdate>,
}

impl ChannelPollSink {
    pub fn new(tx: mpsc::UnboundedSender<PollUpdate>) -> Self {
        Self { tx }
    }

    pub fn pair() -> (Arc<Self>, mpsc::UnboundedReceiver<PollUpdate>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(Self::new(tx)), rx)
    }
}

impl PollSink for ChannelPollSink {
    fn emit(&self, update: PollUpdate) {
        let _ = self.tx.send(update);
    }
}

#[derive(Clone)]
pub struct JobPoller {
    api: Arc<dyn JobApi>,
    notifications: SharedNotifications,
    interval: Duration,
}

impl JobPoller {
    pub fn new(
        api: Arc<dyn JobApi>,
        notifications: SharedNotifications,
        interval: Duration,
    ) -> Self {
        Self {
            api,
            notifications,
            interval,
        }
    }

    /// Begin polling `job_id`. Must be called from within a tokio runtime.
    pub fn start(&self, job_id: JobId, sink: Arc<dyn PollSink>) -> PollHandle {
        let process = lock(&self.notifications).show_processing_start(PROCESS_NAME);
        let mut session = JobSession::new(job_id);
        session.start();
        sv_info!("Polling job {} every {:?}", job_id, self.interval);

        let shared = Arc::new(PollShared {
            session: Mutex::new(session),
            process,
            cancel: CancellationToken::new(),
            notifications: self.notifications.clone(),
            sink,
        });
        let task = tokio::spawn(run(shared.clone(), self.api.clone(), self.interval));

        PollHandle {
            shared,
            task: Some(task),
        }
    }
}

/// Owning handle of an active poll. Dropping it cancels the poll.
pub struct PollHandle {
    shared: Arc<PollShared>,
    task: Option<JoinHandle<()>>,
}

impl PollHandle {
    pub fn job_id(&self) -> JobId {
        self.session().job_id
    }

    pub fn process_id(&self) -> ProcessId {
        self.shared.process
    }

    pub fn session(&self) -> JobSession {
        lock(&self.shared.session).clone()
    }

    /// Stop polling. Safe to call any number of times, in any state.
    pub fn cancel(&self) {
        self.shared.cancel.cancel();
        let mut session = lock(&self.shared.session);
        if session.cancel() {
            sv_info!("Polling of job {} cancelled", session.job_id);
            self.shared.finish(false);
        }
    }

    /// Wait for the poll to stop on its own and return the final session.
    pub async fn finished(mut self) -> JobSession {
        if let Some(task) = self.task.take() {
            if let Err(err) = task.await {
                sv_warn!("Poll task ended abnormally: {}", err);
            }
        }
        self.session()
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

struct PollShared {
    session: Mutex<JobSession>,
    process: ProcessId,
    cancel: CancellationToken,
    notifications: SharedNotifications,
    sink: Arc<dyn PollSink>,
}

impl PollShared {
    /// Feed one poll result into the session. Returns true to keep polling.
    fn apply(&self, result: Result<FullDetails, ApiError>) -> bool {
        let mut session = lock(&self.session);
        if !session.is_active() {
            return false;
        }

        let details = match result {
            Ok(details) => details,
            Err(err) => {
                sv_warn!("Poll of job {} failed: {}", session.job_id, err);
                session.halt_on_error();
                self.finish(false);
                self.sink.emit(PollUpdate::Error(err));
                return false;
            }
        };

        let status = details.status();
        match session.observe(status) {
            PollStep::Continue => {
                sv_debug!(
                    "Job {} is {} after {} polls",
                    session.job_id,
                    status,
                    session.poll_count
                );
                self.sink.emit(PollUpdate::Progress {
                    job_id: session.job_id,
                    status,
                    poll_count: session.poll_count,
                    results_so_far: details.results.len(),
                });
                true
            }
            PollStep::Completed => {
                sv_info!("Job {} completed", session.job_id);
                self.finish(true);
                self.sink.emit(PollUpdate::Completed(Box::new(details)));
                false
            }
            PollStep::Failed => {
                sv_warn!("Job {} failed on the server", session.job_id);
                self.finish(false);
                self.sink.emit(PollUpdate::JobFailed(Box::new(details)));
                false
            }
            PollStep::Ignored => false,
        }
    }

    fn finish(&self, success: bool) {
        lock(&self.notifications).show_processing_complete(PROCESS_NAME, self.process, success);
    }
}

async fn run(shared: Arc<PollShared>, api: Arc<dyn JobApi>, interval: Duration) {
    let job_id = lock(&shared.session).job_id;
    loop {
        let result = tokio::select! {
            _ = shared.cancel.cancelled() => return,
            result = api.full_details(job_id) => result,
        };
        if !shared.apply(result) {
            return;
        }
        tokio::select! {
            _ = shared.cancel.cancelled() => return,
            _ = tokio::time::sleep(interval) => {}
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}
