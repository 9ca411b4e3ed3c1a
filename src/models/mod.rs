pub mod attempt;
pub mod problem;
pub mod review_state;
pub mod sm2;
pub mod summary;

pub use attempt::{Attempt, AttemptMetrics};
pub use problem::Problem;
pub use review_state::ReviewState;
pub use summary::Summary;
