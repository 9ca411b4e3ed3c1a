//! SM-2 (SuperMemo 2) spaced repetition scheduling for practice problems.
//!
//! Each problem carries an ease factor (EF) that controls how fast its review interval grows:
//! - Quality grades 0-2: lapse, repetitions reset and the problem is due again the next day
//! - Quality grades 3-5: interval grows 1 day → 6 days → previous interval × EF
//! - EF is adjusted after every review and never falls below 1.3
//!
//! Grades outside 0-5 are clamped, never rejected. Both functions are pure.

use super::ReviewState;
use chrono::{Days, Local, NaiveDate};

pub const MIN_EASE_FACTOR: f64 = 1.3;
pub const DEFAULT_EASE_FACTOR: f64 = 2.5;

pub const MIN_QUALITY: i32 = 0;
pub const MAX_QUALITY: i32 = 5;
/// Lowest grade that counts as a successful recall
pub const PASSING_QUALITY: i32 = 3;

pub const FIRST_INTERVAL_DAYS: u32 = 1;
pub const SECOND_INTERVAL_DAYS: u32 = 6;

/// Computes the ease factor after a review graded `quality`.
/// quality: 0-5 (0 = complete blackout, 5 = perfect response), clamped
pub fn update_ease_factor(ease_factor: f64, quality: i32) -> f64 {
    let q = quality.clamp(MIN_QUALITY, MAX_QUALITY) as f64;
    let new_ef = ease_factor + (0.1 - (5.0 - q) * (0.08 + (5.0 - q) * 0.02));

    new_ef.max(MIN_EASE_FACTOR)
}

/// Calculates the next review state according to the SM-2 algorithm.
///
/// `reference_date` is the day the attempt happened; the result is due strictly after it,
/// except when `reference_date` is `NaiveDate::MAX`: no later date exists, so the result is due
/// on `NaiveDate::MAX` itself.
/// Mature intervals are rounded half away from zero (`f64::round`).
pub fn schedule_after_attempt(
    state: &ReviewState,
    quality: i32,
    reference_date: NaiveDate,
) -> ReviewState {
    let quality = quality.clamp(MIN_QUALITY, MAX_QUALITY);
    let ease_factor = update_ease_factor(state.ease_factor, quality);

    let (interval_days, repetitions) = if quality < PASSING_QUALITY {
        (FIRST_INTERVAL_DAYS, 0)
    } else {
        let new_reps = state.repetitions.saturating_add(1);
        let new_int = match new_reps {
            1 => FIRST_INTERVAL_DAYS,
            2 => SECOND_INTERVAL_DAYS,
            // float-to-int `as` saturates
            _ => (state.interval_days as f64 * ease_factor).round().max(1.0) as u32,
        };
        (new_int, new_reps)
    };

    let next_review_date = reference_date
        .checked_add_days(Days::new(interval_days as u64))
        .unwrap_or(NaiveDate::MAX);

    tracing::debug!(
        quality,
        ease_factor,
        repetitions,
        interval_days,
        %next_review_date,
        "scheduled next review"
    );

    ReviewState {
        ease_factor,
        repetitions,
        interval_days,
        next_review_date,
    }
}

/// [`schedule_after_attempt`] with today's date in the local calendar.
pub fn schedule_after_attempt_today(state: &ReviewState, quality: i32) -> ReviewState {
    schedule_after_attempt(state, quality, Local::now().date_naive())
}
