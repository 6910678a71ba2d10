use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use sentiview_core::{SearchFilters, SearchQuery, SentimentBucket, SortBy, SortOrder};

#[derive(Parser, Debug)]
#[command(name = "sentiview")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Submit sentiment analyses and browse their results")]
pub struct Cli {
    /// Base URL of the analysis API.
    #[arg(long, env = "SENTIVIEW_API_URL", value_name = "URL")]
    pub api_url: Option<String>,

    /// Directory holding preferences and the log file.
    #[arg(long, env = "SENTIVIEW_HOME", default_value = ".sentiview", value_name = "DIR")]
    pub state_dir: PathBuf,

    /// Log debug output to the terminal as well as the log file.
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Exchange credentials for an API token and store it.
    Login {
        #[arg(long)]
        username: String,
        #[arg(long, env = "SENTIVIEW_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the stored token.
    Logout,
    /// List analyses.
    Jobs,
    /// Start a new analysis.
    Submit {
        query: String,
        /// Sources to search, e.g. reddit, twitter.
        #[arg(short, long = "source", required = true)]
        sources: Vec<String>,
        /// Models to score with; the first is the primary one.
        #[arg(short, long = "model")]
        models: Vec<String>,
        /// Poll until the analysis finishes.
        #[arg(long)]
        wait: bool,
    },
    /// Poll an analysis until it finishes. Ctrl-C stops polling.
    Watch { id: u64 },
    /// Search the results of an analysis.
    Search(SearchArgs),
    /// Override the sentiment score of one result.
    Edit {
        id: u64,
        result_id: u64,
        #[arg(long, allow_hyphen_values = true)]
        score: f64,
        #[arg(long, default_value = "")]
        reason: String,
    },
    /// Show or change the dashboard theme.
    Theme { id: Option<String> },
}

#[derive(Args, Debug, Clone)]
pub struct SearchArgs {
    pub id: u64,
    #[arg(short, long, default_value = "")]
    pub query: String,
    #[arg(long, value_enum, default_value_t = SentimentArg::All)]
    pub sentiment: SentimentArg,
    #[arg(long)]
    pub sarcasm: Option<bool>,
    #[arg(long)]
    pub bot: Option<bool>,
    #[arg(long, default_value_t = 0.0)]
    pub min_iq: f64,
    #[arg(long, value_enum, default_value_t = SortArg::Date)]
    pub sort_by: SortArg,
    #[arg(long)]
    pub ascending: bool,
    #[arg(short, long, default_value_t = 1)]
    pub page: u32,
    #[arg(long, default_value_t = sentiview_core::DEFAULT_PAGE_SIZE)]
    pub page_size: u32,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SentimentArg {
    All,
    Positive,
    Negative,
    Neutral,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortArg {
    Date,
    Score,
    Iq,
    Bot,
}

impl SearchArgs {
    pub fn to_query(&self) -> SearchQuery {
        let sentiment = match self.sentiment {
            SentimentArg::All => SentimentBucket::All,
            SentimentArg::Positive => SentimentBucket::Positive,
            SentimentArg::Negative => SentimentBucket::Negative,
            SentimentArg::Neutral => SentimentBucket::Neutral,
        };
        let sort_by = match self.sort_by {
            SortArg::Date => SortBy::Date,
            SortArg::Score => SortBy::Score,
            SortArg::Iq => SortBy::PerceivedIq,
            SortArg::Bot => SortBy::BotProbability,
        };
        let sort_order = if self.ascending {
            SortOrder::Asc
        } else {
            SortOrder::Desc
        };

        SearchQuery::default()
            .with_filters(SearchFilters {
                text: self.query.clone(),
                sentiment,
                sarcasm: self.sarcasm,
                bot: self.bot,
                min_iq: self.min_iq,
            })
            .with_sort(sort_by, sort_order)
            .with_page_size(self.page_size)
            .with_page(self.page)
    }
}
