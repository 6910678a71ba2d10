use std::sync::{Arc, Mutex, MutexGuard};

use futures_util::future::try_join4;
use sentiview_core::{
    BotAnalysis, FullDetails, IqBucket, JobId, SentimentByDate, SequenceTracker, Summary,
};
use sentiview_logging::{sv_debug, sv_warn};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::{ApiError, JobApi};

/// The chart inputs of one job.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Aggregates {
    pub summary: Summary,
    pub sentiment_by_date: Vec<SentimentByDate>,
    pub iq_distribution: Vec<IqBucket>,
    pub bot_analysis: BotAnalysis,
}

impl Aggregates {
    pub fn from_details(details: &FullDetails) -> Self {
        Self {
            summary: details.summary.clone().unwrap_or_default(),
            sentiment_by_date: details.sentiment_by_date.clone(),
            iq_distribution: details.iq_distribution.clone(),
            bot_analysis: details.bot_analysis.clone().unwrap_or_default(),
        }
    }
}

/// Keeps the latest aggregates of a job and refetches them on demand.
///
/// Overlapping refreshes are allowed; only the most recently started one may
/// publish.
#[derive(Clone)]
pub struct AggregateRefresher {
    api: Arc<dyn JobApi>,
    job_id: JobId,
    view: Arc<watch::Sender<Option<Aggregates>>>,
    generations: Arc<Mutex<SequenceTracker>>,
}

impl AggregateRefresher {
    pub fn new(api: Arc<dyn JobApi>, job_id: JobId) -> Self {
        let (view, _) = watch::channel(None);
        Self {
            api,
            job_id,
            view: Arc::new(view),
            generations: Arc::new(Mutex::new(SequenceTracker::new())),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Aggregates>> {
        self.view.subscribe()
    }

    pub fn latest(&self) -> Option<Aggregates> {
        self.view.borrow().clone()
    }

    /// Publish aggregates already present in a full-details response.
    pub fn seed(&self, details: &FullDetails) {
        self.lock_generations().issue();
        self.view.send_replace(Some(Aggregates::from_details(details)));
    }

    /// Fetch all four aggregates concurrently. On failure the previous
    /// aggregates stay in place.
    pub async fn refresh(&self) -> Result<Aggregates, ApiError> {
        let generation = self.lock_generations().issue();
        let id = self.job_id;
        let (summary, sentiment_by_date, iq_distribution, bot_analysis) = try_join4(
            self.api.summary(id),
            self.api.sentiment_by_date(id),
            self.api.iq_distribution(id),
            self.api.bot_analysis(id),
        )
        .await?;
        let aggregates = Aggregates {
            summary,
            sentiment_by_date,
            iq_distribution,
            bot_analysis,
        };

        let generations = self.lock_generations();
        if generations.is_current(generation) {
            self.view.send_replace(Some(aggregates.clone()));
        } else {
            sv_debug!(
                "Dropping aggregates {} for job {} (latest is {})",
                generation,
                id,
                generations.highest_issued()
            );
        }
        Ok(aggregates)
    }

    /// Fire-and-forget refresh. Must be called from within a tokio runtime.
    pub fn refresh_in_background(&self) -> JoinHandle<()> {
        let refresher = self.clone();
        tokio::spawn(async move {
            if let Err(err) = refresher.refresh().await {
                sv_warn!(
                    "Refreshing aggregates of job {} failed: {}",
                    refresher.job_id,
                    err
                );
            }
        })
    }

    fn lock_generations(&self) -> MutexGuard<'_, SequenceTracker> {
        self.generations.lock().unwrap_or_else(|e| e.into_inner())
    }
}
