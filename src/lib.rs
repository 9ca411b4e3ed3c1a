pub mod config;
pub mod database;
pub mod export;
pub mod models;

pub use models::sm2::{schedule_after_attempt, schedule_after_attempt_today, update_ease_factor};
pub use models::{Attempt, AttemptMetrics, Problem, ReviewState, Summary};
