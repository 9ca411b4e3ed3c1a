//! Aggregate numbers shown on the main screen.
use serde::Serialize;

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Summary {
    pub total_problems: usize,
    pub due_problems: usize,
    pub total_attempts: usize,
    /// Attempts graded below the passing quality
    pub lapses: usize,
    pub average_quality: Option<f64>,
}
