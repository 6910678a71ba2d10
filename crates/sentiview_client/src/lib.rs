//! Sentiview client: the async job lifecycle over the analysis backend.
//!
//! Everything here talks to the server through [`JobApi`]; timers and
//! background tasks run on tokio.
mod aggregates;
mod api;
mod auth;
mod edits;
mod error;
mod http;
mod persist;
mod poller;
mod search;
mod settings;

use std::sync::{Arc, Mutex};

use sentiview_core::{NotificationQueue, NotificationSettings};

pub use aggregates::{AggregateRefresher, Aggregates};
pub use api::{job_key, results_key, summary_key, JobApi, ReqwestJobApi, JOB_LIST_KEY};
pub use auth::{TokenHook, TokenStore};
pub use edits::EditController;
pub use error::{ApiError, ApiErrorKind};
pub use http::{new_shared_cache, HttpClient, SharedCache};
pub use persist::{ensure_state_dir, AtomicFile, PersistError};
pub use poller::{ChannelPollSink, JobPoller, PollHandle, PollSink, PollUpdate, PROCESS_NAME};
pub use search::{QueryManager, SearchView};
pub use settings::{AuthScheme, ClientSettings, API_URL_ENV, DEBOUNCE_MS_ENV, POLL_MS_ENV};

/// The notification queue as shared between the poller and the front end.
pub type SharedNotifications = Arc<Mutex<NotificationQueue>>;

pub fn shared_notifications(settings: NotificationSettings) -> SharedNotifications {
    Arc::new(Mutex::new(NotificationQueue::new(settings)))
}
