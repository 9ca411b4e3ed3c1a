//! Append-only log entry for one graded attempt.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Optional self-reported numbers for an attempt.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptMetrics {
    pub time_spent_min: Option<u32>,
    pub hints_used: Option<u32>,
}

impl AttemptMetrics {
    /// Parses form input. Anything that is not a plain non-negative number counts as absent.
    pub fn from_input(time_spent_min: &str, hints_used: &str) -> Self {
        Self {
            time_spent_min: parse_count(time_spent_min),
            hints_used: parse_count(hints_used),
        }
    }
}

fn parse_count(input: &str) -> Option<u32> {
    let input = input.trim();
    if input.is_empty() || !input.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    input.parse().ok()
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Attempt {
    pub id: i64,
    pub problem_id: i64,
    pub attempted_at: DateTime<Utc>,
    pub quality: i32,
    pub metrics: AttemptMetrics,
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_from_input() {
        let metrics = AttemptMetrics::from_input(" 25 ", "2");
        assert_eq!(metrics.time_spent_min, Some(25));
        assert_eq!(metrics.hints_used, Some(2));
    }

    #[test]
    fn test_metrics_ignore_non_digits() {
        let metrics = AttemptMetrics::from_input("-5", "two");
        assert_eq!(metrics, AttemptMetrics::default());

        let metrics = AttemptMetrics::from_input("", "+1");
        assert_eq!(metrics.time_spent_min, None);
        assert_eq!(metrics.hints_used, None);
    }
}
