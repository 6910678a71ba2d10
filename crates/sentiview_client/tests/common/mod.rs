#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, Once};
use std::time::Duration;

use async_trait::async_trait;
use sentiview_client::{ApiError, ApiErrorKind, JobApi};
use sentiview_core::{
    BotAnalysis, FullDetails, IqBucket, Job, JobId, JobStatus, NewJob, ResultId, ResultRecord,
    ResultUpdate, ScoreOverride, SearchQuery, SearchResponse, SentimentByDate, Summary,
};

pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(sentiview_logging::initialize_for_tests);
}

pub fn record(id: ResultId, score: f64) -> ResultRecord {
    ResultRecord {
        id,
        content: format!("post {id}"),
        score,
        post_date: Some("2024-03-01".into()),
        perceived_iq: Some(0.5),
        bot_probability: None,
        source_type: Some("reddit".into()),
        override_reason: None,
    }
}

pub fn job(id: JobId, status: JobStatus) -> Job {
    Job {
        id,
        query: "rust".into(),
        source: vec!["reddit".into()],
        model: Some("vader".into()),
        created_at: None,
        status: Some(status),
        twitter_grok_summary: None,
    }
}

pub fn details(id: JobId, status: JobStatus, rows: usize) -> FullDetails {
    FullDetails {
        analysis: job(id, status),
        summary: Some(Summary {
            total_posts: rows as u64,
            ..Summary::default()
        }),
        sentiment_by_date: Vec::new(),
        iq_distribution: Vec::new(),
        bot_analysis: None,
        results: (1..=rows as u64).map(|i| record(i, 0.1)).collect(),
        twitter_grok_summary: None,
        content_summary: None,
    }
}

pub fn network_error() -> ApiError {
    ApiError::new(ApiErrorKind::Network, "connection refused")
}

/// In-memory backend with scripted answers and call counters.
#[derive(Default)]
pub struct FakeApi {
    pub job_id: JobId,
    /// Statuses returned by successive `full_details` calls; the last one repeats.
    pub statuses: Mutex<VecDeque<Result<JobStatus, ApiError>>>,
    pub details_delay: Mutex<Duration>,
    pub details_calls: AtomicUsize,
    /// Rows served by `search`, sliced per page.
    pub rows: Mutex<Vec<ResultRecord>>,
    /// Delay and outcome of successive `search` calls, taken when a call starts.
    pub search_script: Mutex<VecDeque<(Duration, Option<ApiError>)>>,
    pub search_calls: Mutex<Vec<SearchQuery>>,
    pub update_response: Mutex<Option<Result<ResultUpdate, ApiError>>>,
    pub update_calls: Mutex<Vec<(ResultId, ScoreOverride)>>,
    pub summary_calls: AtomicUsize,
    pub summary_total: Mutex<u64>,
    pub summary_errors: Mutex<VecDeque<ApiError>>,
}

impl FakeApi {
    pub fn new(job_id: JobId) -> Self {
        Self {
            job_id,
            ..Self::default()
        }
    }

    pub fn with_statuses(self, statuses: Vec<Result<JobStatus, ApiError>>) -> Self {
        *self.statuses.lock().unwrap() = statuses.into();
        self
    }

    pub fn with_rows(self, rows: Vec<ResultRecord>) -> Self {
        *self.rows.lock().unwrap() = rows;
        self
    }

    pub fn with_details_delay(self, delay: Duration) -> Self {
        *self.details_delay.lock().unwrap() = delay;
        self
    }

    pub fn push_search_delay(&self, delay: Duration) {
        self.search_script.lock().unwrap().push_back((delay, None));
    }

    pub fn push_failing_search(&self, delay: Duration, err: ApiError) {
        self.search_script.lock().unwrap().push_back((delay, Some(err)));
    }

    pub fn fail_next_search(&self, err: ApiError) {
        self.push_failing_search(Duration::ZERO, err);
    }

    pub fn answer_updates_with(&self, response: Result<ResultUpdate, ApiError>) {
        *self.update_response.lock().unwrap() = Some(response);
    }

    pub fn set_summary_total(&self, total: u64) {
        *self.summary_total.lock().unwrap() = total;
    }

    pub fn fail_next_summary(&self, err: ApiError) {
        self.summary_errors.lock().unwrap().push_back(err);
    }

    pub fn summary_calls(&self) -> usize {
        self.summary_calls.load(Ordering::SeqCst)
    }

    pub fn details_calls(&self) -> usize {
        self.details_calls.load(Ordering::SeqCst)
    }

    pub fn search_calls(&self) -> Vec<SearchQuery> {
        self.search_calls.lock().unwrap().clone()
    }

    fn next_status(&self) -> Result<JobStatus, ApiError> {
        let mut statuses = self.statuses.lock().unwrap();
        if statuses.len() > 1 {
            statuses.pop_front().unwrap()
        } else {
            statuses.front().cloned().unwrap_or(Ok(JobStatus::Pending))
        }
    }
}

#[async_trait]
impl JobApi for FakeApi {
    async fn list_jobs(&self) -> Result<Vec<Job>, ApiError> {
        Ok(vec![job(self.job_id, JobStatus::Completed)])
    }

    async fn create_job(&self, new_job: &NewJob) -> Result<Job, ApiError> {
        let mut created = job(self.job_id, JobStatus::Pending);
        created.query = new_job.query.clone();
        Ok(created)
    }

    async fn job(&self, id: JobId) -> Result<Job, ApiError> {
        Ok(job(id, JobStatus::Completed))
    }

    async fn full_details(&self, id: JobId) -> Result<FullDetails, ApiError> {
        self.details_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.details_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let status = self.next_status()?;
        Ok(details(id, status, self.rows.lock().unwrap().len()))
    }

    async fn summary(&self, _id: JobId) -> Result<Summary, ApiError> {
        self.summary_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.summary_errors.lock().unwrap().pop_front() {
            return Err(err);
        }
        Ok(Summary {
            total_posts: *self.summary_total.lock().unwrap(),
            ..Summary::default()
        })
    }

    async fn sentiment_by_date(&self, _id: JobId) -> Result<Vec<SentimentByDate>, ApiError> {
        Ok(Vec::new())
    }

    async fn iq_distribution(&self, _id: JobId) -> Result<Vec<IqBucket>, ApiError> {
        Ok(Vec::new())
    }

    async fn bot_analysis(&self, _id: JobId) -> Result<BotAnalysis, ApiError> {
        Ok(BotAnalysis::default())
    }

    async fn results(&self, _id: JobId) -> Result<Vec<ResultRecord>, ApiError> {
        Ok(self.rows.lock().unwrap().clone())
    }

    async fn search(&self, _id: JobId, query: &SearchQuery) -> Result<SearchResponse, ApiError> {
        self.search_calls.lock().unwrap().push(query.clone());
        let step = self.search_script.lock().unwrap().pop_front();
        if let Some((delay, error)) = step {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            if let Some(err) = error {
                return Err(err);
            }
        }

        let rows = self.rows.lock().unwrap().clone();
        let size = query.page_size.max(1) as usize;
        let start = (query.page.max(1) as usize - 1) * size;
        let page = rows.iter().skip(start).take(size).cloned().collect();
        Ok(SearchResponse::Paged {
            results: page,
            total_count: Some(rows.len() as u64),
            page: Some(query.page),
            page_size: Some(query.page_size),
            total_pages: None,
        })
    }

    async fn update_result(
        &self,
        _id: JobId,
        result_id: ResultId,
        body: &ScoreOverride,
    ) -> Result<ResultUpdate, ApiError> {
        self.update_calls
            .lock()
            .unwrap()
            .push((result_id, body.clone()));
        self.update_response
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| Ok(ResultUpdate::default()))
    }
}
