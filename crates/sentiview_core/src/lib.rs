//! Sentiview core: pure job-lifecycle state, caching and query sequencing.
mod cache;
mod clock;
mod edit;
mod model;
mod notify;
mod poll;
mod query;

pub use cache::{CacheStamp, TtlCache, DEFAULT_TTL};
pub use clock::{system_clock, Clock, ManualClock};
pub use edit::{clamp_score, EditReconciler, EditSession, MergeOutcome};
pub use model::{
    BotAnalysis, FullDetails, IqBucket, Job, JobId, JobStatus, NewJob, ResultId, ResultRecord,
    ResultUpdate, ScoreOverride, SentimentByDate, SentimentCounts, SentimentShares, Summary,
};
pub use notify::{
    Lifetime, Notification, NotificationId, NotificationQueue, NotificationSettings, ProcessId,
    Severity,
};
pub use poll::{JobSession, PollPhase, PollStep};
pub use query::{
    total_pages, SearchFilters, SearchQuery, SearchResponse, SearchResultSet, SentimentBucket,
    SequenceNumber, SequenceTracker, SortBy, SortOrder, DEFAULT_PAGE_SIZE, NEUTRAL_BAND,
};
