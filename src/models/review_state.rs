//! Memory-strength state of a single problem.
use super::sm2::DEFAULT_EASE_FACTOR;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Scheduling state of a problem. Replaced as a whole after every graded attempt.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReviewState {
    pub ease_factor: f64,
    pub repetitions: u32,
    /// Interval used by the previous scheduling step
    pub interval_days: u32,
    pub next_review_date: NaiveDate,
}

impl ReviewState {
    /// State of a freshly registered problem, due on `today`.
    pub fn new(today: NaiveDate) -> Self {
        Self {
            ease_factor: DEFAULT_EASE_FACTOR,
            repetitions: 0,
            interval_days: 0,
            next_review_date: today,
        }
    }

    pub fn is_due(&self, on: NaiveDate) -> bool {
        self.next_review_date <= on
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_defaults() {
        let today = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let state = ReviewState::new(today);

        assert_eq!(state.ease_factor, 2.5);
        assert_eq!(state.repetitions, 0);
        assert_eq!(state.interval_days, 0);
        assert_eq!(state.next_review_date, today);
    }

    #[test]
    fn test_is_due() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let state = ReviewState::new(today);

        assert!(state.is_due(today));
        assert!(state.is_due(today.succ_opt().unwrap()));
        assert!(!state.is_due(today.pred_opt().unwrap()));
    }
}
