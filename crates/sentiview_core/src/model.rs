use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

pub type JobId = u64;
pub type ResultId = u64;

/// Server-side lifecycle of an analysis job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pending" => Some(JobStatus::Pending),
            "processing" => Some(JobStatus::Processing),
            "completed" => Some(JobStatus::Completed),
            "failed" => Some(JobStatus::Failed),
            _ => None,
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Pending => write!(f, "pending"),
            JobStatus::Processing => write!(f, "processing"),
            JobStatus::Completed => write!(f, "completed"),
            JobStatus::Failed => write!(f, "failed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    #[serde(default)]
    pub query: String,
    #[serde(default, deserialize_with = "one_or_many")]
    pub source: Vec<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    /// Statuses the client does not recognise read as `None`.
    #[serde(default, deserialize_with = "lenient_status")]
    pub status: Option<JobStatus>,
    #[serde(default)]
    pub twitter_grok_summary: Option<String>,
}

impl Job {
    /// A job without a recognised status is still waiting on the server.
    pub fn effective_status(&self) -> JobStatus {
        self.status.unwrap_or(JobStatus::Pending)
    }
}

/// Payload for creating a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewJob {
    pub query: String,
    pub source: Vec<String>,
    pub model: String,
    pub selected_llms: Vec<String>,
}

impl NewJob {
    pub const DEFAULT_MODEL: &'static str = "vader";

    /// Build a payload; the first selected model becomes the primary one.
    pub fn new(query: impl Into<String>, sources: Vec<String>, models: Vec<String>) -> Self {
        let mut selected: Vec<String> = models
            .into_iter()
            .map(|m| m.trim().to_lowercase())
            .filter(|m| !m.is_empty())
            .collect();
        if selected.is_empty() {
            selected.push(Self::DEFAULT_MODEL.to_string());
        }
        Self {
            query: query.into(),
            source: sources,
            model: selected[0].clone(),
            selected_llms: selected,
        }
    }
}

/// One analysed post.
///
/// `perceived_iq` and `bot_probability` are `None` when the model that
/// scored the post does not compute them (JSON `null` or missing).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub id: ResultId,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub post_date: Option<String>,
    #[serde(default)]
    pub perceived_iq: Option<f64>,
    #[serde(default)]
    pub bot_probability: Option<f64>,
    #[serde(default)]
    pub source_type: Option<String>,
    #[serde(default)]
    pub override_reason: Option<String>,
}

impl ResultRecord {
    /// IQ-style display score, `iq * 90 + 55` rounded.
    pub fn perceived_iq_score(&self) -> Option<u32> {
        self.perceived_iq
            .map(|iq| (iq.clamp(0.0, 1.0) * 90.0 + 55.0).round() as u32)
    }

    pub fn sentiment(&self) -> crate::SentimentBucket {
        crate::SentimentBucket::of(self.score)
    }
}

/// Fields confirmed by the server after a patch. Absent fields are unchanged.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ResultUpdate {
    #[serde(default)]
    pub id: Option<ResultId>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub post_date: Option<String>,
    #[serde(default)]
    pub perceived_iq: Option<f64>,
    #[serde(default)]
    pub bot_probability: Option<f64>,
    #[serde(default)]
    pub source_type: Option<String>,
    #[serde(default)]
    pub override_reason: Option<String>,
}

impl ResultUpdate {
    /// Overwrite only the fields the server sent back.
    pub fn apply_to(&self, record: &mut ResultRecord) {
        if let Some(content) = &self.content {
            record.content = content.clone();
        }
        if let Some(score) = self.score {
            record.score = score;
        }
        if let Some(post_date) = &self.post_date {
            record.post_date = Some(post_date.clone());
        }
        if let Some(iq) = self.perceived_iq {
            record.perceived_iq = Some(iq);
        }
        if let Some(bot) = self.bot_probability {
            record.bot_probability = Some(bot);
        }
        if let Some(source_type) = &self.source_type {
            record.source_type = Some(source_type.clone());
        }
        if let Some(reason) = &self.override_reason {
            record.override_reason = Some(reason.clone());
        }
    }
}

/// Body of a single-result patch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreOverride {
    pub manual_sentiment: f64,
    pub override_reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SentimentCounts {
    #[serde(default)]
    pub positive: u64,
    #[serde(default)]
    pub negative: u64,
    #[serde(default)]
    pub neutral: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SentimentShares {
    #[serde(default)]
    pub positive: f64,
    #[serde(default)]
    pub negative: f64,
    #[serde(default)]
    pub neutral: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Summary {
    #[serde(default)]
    pub total_posts: u64,
    #[serde(default)]
    pub average_score: f64,
    #[serde(default)]
    pub sentiment_distribution: SentimentCounts,
    #[serde(default)]
    pub sentiment_percentages: SentimentShares,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentByDate {
    pub post_date: String,
    #[serde(default)]
    pub avg_score: f64,
    #[serde(default)]
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IqBucket {
    pub perceived_iq: f64,
    #[serde(default)]
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BotAnalysis {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub bots: u64,
    #[serde(default)]
    pub not_bots: u64,
    #[serde(default)]
    pub avg_bot_probability: f64,
}

/// Everything the results view shows for one job, fetched in one call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FullDetails {
    pub analysis: Job,
    #[serde(default)]
    pub summary: Option<Summary>,
    #[serde(default)]
    pub sentiment_by_date: Vec<SentimentByDate>,
    #[serde(default)]
    pub iq_distribution: Vec<IqBucket>,
    #[serde(default)]
    pub bot_analysis: Option<BotAnalysis>,
    #[serde(default)]
    pub results: Vec<ResultRecord>,
    #[serde(default)]
    pub twitter_grok_summary: Option<String>,
    #[serde(default)]
    pub content_summary: Option<String>,
}

impl FullDetails {
    pub fn status(&self) -> JobStatus {
        self.analysis.effective_status()
    }
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
        Nothing(()),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(value) => value
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToOwned::to_owned)
            .collect(),
        OneOrMany::Many(values) => values,
        OneOrMany::Nothing(()) => Vec::new(),
    })
}

fn lenient_status<'de, D>(deserializer: D) -> Result<Option<JobStatus>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(JobStatus::parse))
}
