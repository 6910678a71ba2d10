use std::fmt;

use serde::Deserialize;

use crate::ResultRecord;

pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Scores strictly above this are positive, strictly below its negation negative.
pub const NEUTRAL_BAND: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SentimentBucket {
    #[default]
    All,
    Positive,
    Negative,
    Neutral,
}

impl SentimentBucket {
    /// Bucket a single score. Never returns `All`.
    pub fn of(score: f64) -> Self {
        if score > NEUTRAL_BAND {
            SentimentBucket::Positive
        } else if score < -NEUTRAL_BAND {
            SentimentBucket::Negative
        } else {
            SentimentBucket::Neutral
        }
    }

    pub fn as_param(self) -> &'static str {
        match self {
            SentimentBucket::All => "all",
            SentimentBucket::Positive => "positive",
            SentimentBucket::Negative => "negative",
            SentimentBucket::Neutral => "neutral",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortBy {
    #[default]
    Date,
    Score,
    PerceivedIq,
    BotProbability,
}

impl SortBy {
    pub fn as_param(self) -> &'static str {
        match self {
            SortBy::Date => "date",
            SortBy::Score => "score",
            SortBy::PerceivedIq => "iq",
            SortBy::BotProbability => "bot_probability",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_param(self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SearchFilters {
    pub text: String,
    pub sentiment: SentimentBucket,
    /// `None` means "either".
    pub sarcasm: Option<bool>,
    pub bot: Option<bool>,
    /// Lower bound on `perceived_iq`, in `[0, 1]`.
    pub min_iq: f64,
}

/// A complete search request. Replaced as a whole, never patched in place
/// while a request built from it is pending.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    pub filters: SearchFilters,
    pub sort_by: SortBy,
    pub sort_order: SortOrder,
    pub page: u32,
    pub page_size: u32,
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            filters: SearchFilters::default(),
            sort_by: SortBy::default(),
            sort_order: SortOrder::default(),
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl SearchQuery {
    /// New filters always restart from the first page.
    pub fn with_filters(&self, filters: SearchFilters) -> Self {
        Self {
            filters,
            page: 1,
            ..self.clone()
        }
    }

    pub fn with_sort(&self, sort_by: SortBy, sort_order: SortOrder) -> Self {
        Self {
            sort_by,
            sort_order,
            page: 1,
            ..self.clone()
        }
    }

    pub fn with_page_size(&self, page_size: u32) -> Self {
        Self {
            page_size: page_size.max(1),
            page: 1,
            ..self.clone()
        }
    }

    /// A page turn keeps every filter.
    pub fn with_page(&self, page: u32) -> Self {
        Self {
            page: page.max(1),
            ..self.clone()
        }
    }

    /// Query-string pairs in the order the backend documents them.
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("q", self.filters.text.trim().to_string()),
            ("sentiment", self.filters.sentiment.as_param().to_string()),
        ];
        if let Some(sarcasm) = self.filters.sarcasm {
            params.push(("sarcasm", sarcasm.to_string()));
        }
        if let Some(bot) = self.filters.bot {
            params.push(("bot", bot.to_string()));
        }
        params.push(("min_iq", format_unit(self.filters.min_iq)));
        params.push(("sort_by", self.sort_by.as_param().to_string()));
        params.push(("sort_order", self.sort_order.as_param().to_string()));
        params.push(("page", self.page.max(1).to_string()));
        params.push(("page_size", self.page_size.max(1).to_string()));
        params
    }
}

fn format_unit(value: f64) -> String {
    let clamped = if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    };
    format!("{clamped}")
}

/// Position of a submitted query in submission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SequenceNumber(pub u64);

impl fmt::Display for SequenceNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Stamps queries at submission time and decides which responses may publish.
#[derive(Debug, Clone, Default)]
pub struct SequenceTracker {
    highest_issued: SequenceNumber,
}

impl SequenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&mut self) -> SequenceNumber {
        self.highest_issued = SequenceNumber(self.highest_issued.0 + 1);
        self.highest_issued
    }

    pub fn highest_issued(&self) -> SequenceNumber {
        self.highest_issued
    }

    /// Only a response for the most recently issued query is current.
    pub fn is_current(&self, seq: SequenceNumber) -> bool {
        seq >= self.highest_issued
    }
}

/// One page of search results as published to the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResultSet {
    pub results: Vec<ResultRecord>,
    pub total_count: u64,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
    pub sequence: SequenceNumber,
}

impl SearchResultSet {
    pub fn empty(page_size: u32, sequence: SequenceNumber) -> Self {
        Self {
            results: Vec::new(),
            total_count: 0,
            page: 1,
            page_size: page_size.max(1),
            total_pages: 0,
            sequence,
        }
    }

    /// Merge a confirmed update into the displayed row with the same id,
    /// keeping its position. Returns the row index when one was updated.
    pub fn merge_in_place(
        &mut self,
        id: crate::ResultId,
        update: &crate::ResultUpdate,
    ) -> Option<usize> {
        let index = self.results.iter().position(|r| r.id == id)?;
        update.apply_to(&mut self.results[index]);
        Some(index)
    }
}

impl Default for SearchResultSet {
    fn default() -> Self {
        Self::empty(DEFAULT_PAGE_SIZE, SequenceNumber::default())
    }
}

pub fn total_pages(total_count: u64, page_size: u32) -> u32 {
    let page_size = u64::from(page_size.max(1));
    total_count.div_ceil(page_size) as u32
}

/// Search payload as sent by the backend: a paged object, or a bare list
/// from older endpoints.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum SearchResponse {
    Bare(Vec<ResultRecord>),
    Paged {
        results: Vec<ResultRecord>,
        #[serde(default, alias = "count")]
        total_count: Option<u64>,
        #[serde(default)]
        page: Option<u32>,
        #[serde(default)]
        page_size: Option<u32>,
        #[serde(default)]
        total_pages: Option<u32>,
    },
}

impl SearchResponse {
    pub fn into_result_set(self, query: &SearchQuery, sequence: SequenceNumber) -> SearchResultSet {
        match self {
            SearchResponse::Paged {
                results,
                total_count,
                page,
                page_size,
                total_pages: pages,
            } => {
                let page_size = page_size.unwrap_or(query.page_size).max(1);
                let total_count = total_count.unwrap_or(results.len() as u64);
                SearchResultSet {
                    results,
                    total_count,
                    page: page.unwrap_or(query.page).max(1),
                    page_size,
                    total_pages: pages.unwrap_or_else(|| total_pages(total_count, page_size)),
                    sequence,
                }
            }
            SearchResponse::Bare(results) => {
                let total_count = results.len() as u64;
                let page_size = query.page_size.max(1);
                SearchResultSet {
                    results,
                    total_count,
                    page: query.page.max(1),
                    page_size,
                    total_pages: total_pages(total_count, page_size),
                    sequence,
                }
            }
        }
    }
}
