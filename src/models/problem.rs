//! Practice problem with its scheduling state.
use super::{AttemptMetrics, ReviewState};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Problem {
    pub id: i64,
    pub title: String,
    pub url: String,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub review: ReviewState,
    pub last_attempt_at: Option<DateTime<Utc>>,
    pub last_quality: Option<i32>,
    /// Metrics reported with the last attempt
    pub metrics: AttemptMetrics,
}

/// Splits a comma separated tag list, dropping blanks.
pub fn parse_tags(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn join_tags(tags: &[String]) -> String {
    tags.join(", ")
}
