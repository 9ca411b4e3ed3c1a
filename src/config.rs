//! Command line and environment configuration.
use chrono::{Local, NaiveDate};
use clap::Parser;
use std::path::PathBuf;

#[derive(Clone, Debug, Parser)]
#[command(
    name = "problem-tracker",
    version,
    about = "Spaced repetition tracker for practice problems"
)]
pub struct Config {
    /// SQLite database file
    #[arg(long, env = "PROBLEM_TRACKER_DB", default_value = "leetcode.db")]
    pub db: PathBuf,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, env = "PROBLEM_TRACKER_LOG", default_value = "info")]
    pub log_level: String,

    /// Review date to start on (YYYY-MM-DD), defaults to today
    #[arg(long)]
    pub review_date: Option<NaiveDate>,
}

impl Config {
    pub fn review_date_or_today(&self) -> NaiveDate {
        self.review_date.unwrap_or_else(|| Local::now().date_naive())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_review_date_argument() {
        let config = Config::try_parse_from([
            "problem-tracker",
            "--db",
            "x.db",
            "--review-date",
            "2024-01-10",
        ])
        .unwrap();

        assert_eq!(config.db, PathBuf::from("x.db"));
        assert_eq!(
            config.review_date_or_today(),
            NaiveDate::from_ymd_opt(2024, 1, 10).unwrap()
        );
    }

    #[test]
    fn test_invalid_review_date_is_rejected() {
        let result = Config::try_parse_from(["problem-tracker", "--review-date", "10/01/2024"]);
        assert!(result.is_err());
    }
}
