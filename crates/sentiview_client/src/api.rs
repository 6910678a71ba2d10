use serde::{Deserialize, Serialize};
use serde_json::Value;

use sentiview_core::{
    BotAnalysis, FullDetails, IqBucket, Job, JobId, NewJob, ResultId, ResultRecord,
    ResultUpdate, ScoreOverride, SearchQuery, SearchResponse, SentimentByDate, Summary,
};

use crate::{ApiError, ApiErrorKind, ClientSettings, HttpClient, TokenStore};

pub const JOB_LIST_KEY: &str = "analyses";

pub fn job_key(id: JobId) -> String {
    format!("analysis-{id}")
}

pub fn summary_key(id: JobId) -> String {
    format!("analysis-summary-{id}")
}

pub fn results_key(id: JobId) -> String {
    format!("analysis-results-{id}")
}

/// The backend's job endpoints, as the rest of the client sees them.
#[async_trait::async_trait]
pub trait JobApi: Send + Sync {
    async fn list_jobs(&self) -> Result<Vec<Job>, ApiError>;

    async fn create_job(&self, job: &NewJob) -> Result<Job, ApiError>;

    async fn job(&self, id: JobId) -> Result<Job, ApiError>;

    /// Status, aggregates and results in one uncached call.
    async fn full_details(&self, id: JobId) -> Result<FullDetails, ApiError>;

    async fn summary(&self, id: JobId) -> Result<Summary, ApiError>;

    async fn sentiment_by_date(&self, id: JobId) -> Result<Vec<SentimentByDate>, ApiError>;

    async fn iq_distribution(&self, id: JobId) -> Result<Vec<IqBucket>, ApiError>;

    async fn bot_analysis(&self, id: JobId) -> Result<BotAnalysis, ApiError>;

    /// Every result row of a job, unpaged.
    async fn results(&self, id: JobId) -> Result<Vec<ResultRecord>, ApiError>;

    async fn search(&self, id: JobId, query: &SearchQuery) -> Result<SearchResponse, ApiError>;

    async fn update_result(
        &self,
        id: JobId,
        result_id: ResultId,
        body: &ScoreOverride,
    ) -> Result<ResultUpdate, ApiError>;
}

#[derive(Debug, Serialize)]
struct Credentials<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    token: String,
}

/// `JobApi` over HTTP.
#[derive(Clone)]
pub struct ReqwestJobApi {
    http: HttpClient,
}

impl ReqwestJobApi {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    pub fn from_settings(settings: ClientSettings, tokens: TokenStore) -> Result<Self, ApiError> {
        Ok(Self::new(HttpClient::new(settings, tokens)?))
    }

    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    /// Exchange credentials for a token and remember it.
    pub async fn login(&self, username: &str, password: &str) -> Result<String, ApiError> {
        let response: LoginResponse = self
            .http
            .post_json(
                "api-token-auth/",
                &Credentials { username, password },
                &[],
            )
            .await?;
        self.http.tokens().set(response.token.clone());
        Ok(response.token)
    }

    pub fn logout(&self) {
        self.http.tokens().clear();
        self.http
            .cache()
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .invalidate_all();
    }

    fn jobs_path(&self) -> String {
        format!("{}/", self.http.settings().jobs_path.trim_matches('/'))
    }

    fn job_path(&self, id: JobId, tail: &str) -> String {
        format!("{}{id}/{tail}", self.jobs_path())
    }
}

#[async_trait::async_trait]
impl JobApi for ReqwestJobApi {
    async fn list_jobs(&self) -> Result<Vec<Job>, ApiError> {
        let value: Value = self
            .http
            .fetch_json(&self.jobs_path(), Some(JOB_LIST_KEY))
            .await?;
        decode_list(value)
    }

    async fn create_job(&self, job: &NewJob) -> Result<Job, ApiError> {
        self.http
            .post_json(&self.jobs_path(), job, &[JOB_LIST_KEY.to_string()])
            .await
    }

    async fn job(&self, id: JobId) -> Result<Job, ApiError> {
        self.http
            .fetch_json(&self.job_path(id, ""), Some(&job_key(id)))
            .await
    }

    async fn full_details(&self, id: JobId) -> Result<FullDetails, ApiError> {
        self.http
            .fetch_json(&self.job_path(id, "full-details/"), None)
            .await
    }

    async fn summary(&self, id: JobId) -> Result<Summary, ApiError> {
        self.http
            .fetch_json(&self.job_path(id, "summary/"), Some(&summary_key(id)))
            .await
    }

    async fn sentiment_by_date(&self, id: JobId) -> Result<Vec<SentimentByDate>, ApiError> {
        self.http
            .fetch_json(&self.job_path(id, "sentiment-by-date/"), None)
            .await
    }

    async fn iq_distribution(&self, id: JobId) -> Result<Vec<IqBucket>, ApiError> {
        self.http
            .fetch_json(&self.job_path(id, "iq-distribution/"), None)
            .await
    }

    async fn bot_analysis(&self, id: JobId) -> Result<BotAnalysis, ApiError> {
        self.http
            .fetch_json(&self.job_path(id, "bot-analysis/"), None)
            .await
    }

    async fn results(&self, id: JobId) -> Result<Vec<ResultRecord>, ApiError> {
        let value: Value = self
            .http
            .fetch_json(&self.job_path(id, "results/"), Some(&results_key(id)))
            .await?;
        decode_list(value)
    }

    async fn search(&self, id: JobId, query: &SearchQuery) -> Result<SearchResponse, ApiError> {
        self.http
            .fetch_json_with_query(&self.job_path(id, "search/"), &query.to_params())
            .await
    }

    async fn update_result(
        &self,
        id: JobId,
        result_id: ResultId,
        body: &ScoreOverride,
    ) -> Result<ResultUpdate, ApiError> {
        let value: Value = self
            .http
            .patch_json(
                &self.job_path(id, &format!("results/{result_id}/")),
                body,
                &[job_key(id), summary_key(id), results_key(id)],
            )
            .await?;
        match value {
            Value::Object(_) => serde_json::from_value(value)
                .map_err(|err| ApiError::new(ApiErrorKind::Decode, err.to_string())),
            _ => Ok(ResultUpdate::default()),
        }
    }
}

/// Decode a list body. Paginated endpoints wrap the items in `results`.
fn decode_list<T: serde::de::DeserializeOwned>(value: Value) -> Result<Vec<T>, ApiError> {
    let items = match value {
        Value::Object(mut map) if map.contains_key("results") => {
            map.remove("results").unwrap_or(Value::Array(Vec::new()))
        }
        other => other,
    };
    serde_json::from_value(items)
        .map_err(|err| ApiError::new(ApiErrorKind::Decode, err.to_string()))
}
