//! Plain-text rendering for the terminal front end.

use chrono::{DateTime, Local};
use sentiview_client::PollUpdate;
use sentiview_core::{Job, Notification, ResultRecord, SearchResultSet, SentimentBucket, Severity};

const CONTENT_WIDTH: usize = 60;

pub fn job_line(job: &Job) -> String {
    let created = job
        .created_at
        .as_deref()
        .map(local_time)
        .unwrap_or_else(|| "-".to_string());
    format!(
        "#{:<5} {:<10} {:<16} {:<30} {}",
        job.id,
        job.effective_status(),
        created,
        truncate(&job.query, 30),
        job.source.join(",")
    )
}

/// RFC 3339 timestamps in local time; anything else is shown as sent.
pub fn local_time(raw: &str) -> String {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(parsed) => parsed
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M")
            .to_string(),
        Err(_) => raw.to_string(),
    }
}

pub fn result_row(record: &ResultRecord) -> String {
    let iq = record
        .perceived_iq_score()
        .map(|score| score.to_string())
        .unwrap_or_else(|| "-".to_string());
    let bot = record
        .bot_probability
        .map(|p| format!("{:.0}%", p * 100.0))
        .unwrap_or_else(|| "-".to_string());
    let edited = if record.override_reason.is_some() {
        "*"
    } else {
        " "
    };
    format!(
        "{:>6} {:>+6.2}{} {:<8} {:>4} {:>4}  {}",
        record.id,
        record.score,
        edited,
        bucket_label(record.sentiment()),
        iq,
        bot,
        truncate(&record.content, CONTENT_WIDTH)
    )
}

pub fn page_footer(set: &SearchResultSet) -> String {
    if set.total_count == 0 {
        return "No results.".to_string();
    }
    format!(
        "Page {} of {} ({} results)",
        set.page, set.total_pages, set.total_count
    )
}

pub fn notification_line(notification: &Notification) -> String {
    let tag = match notification.severity {
        Severity::Success => "ok",
        Severity::Error => "error",
        Severity::Warning => "warn",
        Severity::Info => "info",
    };
    format!("[{tag}] {}", notification.message)
}

pub fn update_line(update: &PollUpdate) -> String {
    match update {
        PollUpdate::Progress {
            job_id,
            status,
            poll_count,
            results_so_far,
        } => format!(
            "Job #{job_id} is {status} (check {poll_count}, {results_so_far} results so far)"
        ),
        PollUpdate::Completed(details) => format!(
            "Job #{} completed with {} results",
            details.analysis.id,
            details.results.len()
        ),
        PollUpdate::JobFailed(details) => format!("Job #{} failed", details.analysis.id),
        PollUpdate::Error(err) => format!("Polling stopped: {}", err.user_message()),
    }
}

fn bucket_label(bucket: SentimentBucket) -> &'static str {
    match bucket {
        SentimentBucket::Positive => "positive",
        SentimentBucket::Negative => "negative",
        SentimentBucket::Neutral | SentimentBucket::All => "neutral",
    }
}

fn truncate(text: &str, width: usize) -> String {
    let single_line = text.replace(['\n', '\r'], " ");
    if single_line.chars().count() <= width {
        return single_line;
    }
    let mut cut: String = single_line.chars().take(width.saturating_sub(3)).collect();
    cut.push_str("...");
    cut
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(score: f64, iq: Option<f64>) -> ResultRecord {
        ResultRecord {
            id: 4,
            content: "line one\nline two".into(),
            score,
            post_date: None,
            perceived_iq: iq,
            bot_probability: Some(0.25),
            source_type: None,
            override_reason: None,
        }
    }

    #[test]
    fn result_row_shows_iq_score_and_bot_share() {
        let row = result_row(&record(0.5, Some(0.5)));
        assert!(row.contains("+0.50"));
        assert!(row.contains("positive"));
        assert!(row.contains("100"));
        assert!(row.contains("25%"));
        assert!(row.ends_with("line one line two"));
    }

    #[test]
    fn missing_iq_renders_as_dash() {
        let row = result_row(&record(0.01, None));
        assert!(row.contains("neutral"));
        assert!(row.contains(" - "));
    }

    #[test]
    fn long_content_is_truncated() {
        let text = "x".repeat(100);
        let cut = truncate(&text, 10);
        assert_eq!(cut, "xxxxxxx...");
    }

    #[test]
    fn non_rfc3339_timestamps_pass_through() {
        assert_eq!(local_time("yesterday"), "yesterday");
    }
}
