//! Database operations for the problem tracker
//!
//! Handles SQLite schema initialization, CRUD operations for problems,
//! the append-only attempt log and SM-2 review state persistence.
//! Every function takes the connection explicitly; nothing here holds global state.

use crate::models::problem::{join_tags, parse_tags};
use crate::models::sm2::{PASSING_QUALITY, schedule_after_attempt};
use crate::models::{Attempt, AttemptMetrics, Problem, ReviewState, Summary};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rusqlite::types::{FromSqlError, Type};
use rusqlite::{Connection, OptionalExtension, Row, TransactionBehavior, params};
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("Problem not found: {0}")]
    NotFound(i64),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

const PROBLEM_COLUMNS: &str = "id, title, url, tags, created_at, ef, reps, interval_days,
     next_review, last_attempt_at, last_q, time_spent_min, hints_used";

/// Review dates are stored as days since 0001-01-01 so SQL comparisons order them
/// correctly for every year chrono can represent.
fn day_number(date: NaiveDate) -> i32 {
    date.num_days_from_ce()
}

fn date_from_day_number(row: &Row, idx: usize) -> rusqlite::Result<NaiveDate> {
    let days: i32 = row.get(idx)?;
    NaiveDate::from_num_days_from_ce_opt(days).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Integer,
            Box::new(FromSqlError::OutOfRange(days as i64)),
        )
    })
}

/// Opens (or creates) the SQLite database at `path` and makes sure the schema exists
pub fn open_database(path: impl AsRef<Path>) -> Result<Connection> {
    let conn = Connection::open(path.as_ref())?;
    init_schema(&conn)?;
    tracing::info!(path = %path.as_ref().display(), "database opened");
    Ok(conn)
}

/// Creates tables for problems and attempts
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;

    // Problems with their current review state
    conn.execute(
        "CREATE TABLE IF NOT EXISTS problems (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            url TEXT NOT NULL,
            tags TEXT NOT NULL DEFAULT '',
            created_at TEXT NOT NULL,
            ef REAL NOT NULL DEFAULT 2.5,
            reps INTEGER NOT NULL DEFAULT 0,
            interval_days INTEGER NOT NULL DEFAULT 0,
            next_review INTEGER NOT NULL,
            last_attempt_at TEXT,
            last_q INTEGER,
            time_spent_min INTEGER,
            hints_used INTEGER
        )",
        (),
    )?;

    // Attempt history, one row per graded attempt
    conn.execute(
        "CREATE TABLE IF NOT EXISTS attempts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            problem_id INTEGER NOT NULL,
            attempted_at TEXT NOT NULL,
            q INTEGER NOT NULL,
            time_spent_min INTEGER,
            hints_used INTEGER,
            notes TEXT,
            FOREIGN KEY (problem_id) REFERENCES problems(id) ON DELETE CASCADE
        )",
        (),
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_problems_next_review ON problems(next_review)",
        (),
    )?;

    Ok(())
}

fn problem_from_row(row: &Row) -> rusqlite::Result<Problem> {
    let tags: String = row.get(3)?;
    Ok(Problem {
        id: row.get(0)?,
        title: row.get(1)?,
        url: row.get(2)?,
        tags: parse_tags(&tags),
        created_at: row.get(4)?,
        review: ReviewState {
            ease_factor: row.get(5)?,
            repetitions: row.get(6)?,
            interval_days: row.get(7)?,
            next_review_date: date_from_day_number(row, 8)?,
        },
        last_attempt_at: row.get(9)?,
        last_quality: row.get(10)?,
        metrics: AttemptMetrics {
            time_spent_min: row.get(11)?,
            hints_used: row.get(12)?,
        },
    })
}

/// Registers a new problem due on `today` with the default review state
///
/// Title and URL are trimmed and must not be empty. Returns the problem ID.
pub fn add_problem(
    title: &str,
    url: &str,
    tags: &[String],
    today: NaiveDate,
    conn: &Connection,
) -> Result<i64> {
    let title = title.trim();
    let url = url.trim();
    if title.is_empty() || url.is_empty() {
        return Err(StoreError::InvalidInput("Title and URL are required.".to_string()));
    }

    let state = ReviewState::new(today);
    conn.execute(
        "INSERT INTO problems (title, url, tags, created_at, ef, reps, interval_days, next_review)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            title,
            url,
            join_tags(tags),
            Utc::now(),
            state.ease_factor,
            state.repetitions,
            state.interval_days,
            day_number(state.next_review_date)
        ],
    )?;

    let id = conn.last_insert_rowid();
    tracing::info!(id, title, "problem added");
    Ok(id)
}

pub fn get_problem(problem_id: i64, conn: &Connection) -> Result<Option<Problem>> {
    let problem = conn
        .query_row(
            &format!("SELECT {PROBLEM_COLUMNS} FROM problems WHERE id = ?1"),
            params![problem_id],
            problem_from_row,
        )
        .optional()?;
    Ok(problem)
}

/// Retrieves every problem, oldest first
pub fn list_problems(conn: &Connection) -> Result<Vec<Problem>> {
    let mut stmt =
        conn.prepare(&format!("SELECT {PROBLEM_COLUMNS} FROM problems ORDER BY id ASC"))?;
    let problems = stmt
        .query_map([], problem_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(problems)
}

/// Retrieves problems due for review
///
/// Returns problems where next_review <= today,
/// ordered by next_review (oldest first), then by ID.
pub fn list_due_problems(today: NaiveDate, conn: &Connection) -> Result<Vec<Problem>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PROBLEM_COLUMNS} FROM problems
         WHERE next_review <= ?1
         ORDER BY next_review ASC, id ASC"
    ))?;
    let problems = stmt
        .query_map(params![day_number(today)], problem_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(problems)
}

/// Stores the scheduler output and last-attempt details on the problem row
pub fn update_problem_after_attempt(
    problem_id: i64,
    state: &ReviewState,
    quality: i32,
    metrics: &AttemptMetrics,
    attempted_at: DateTime<Utc>,
    conn: &Connection,
) -> Result<()> {
    let updated = conn.execute(
        "UPDATE problems
         SET ef = ?1, reps = ?2, interval_days = ?3, next_review = ?4,
             last_attempt_at = ?5, last_q = ?6, time_spent_min = ?7, hints_used = ?8
         WHERE id = ?9",
        params![
            state.ease_factor,
            state.repetitions,
            state.interval_days,
            day_number(state.next_review_date),
            attempted_at,
            quality,
            metrics.time_spent_min,
            metrics.hints_used,
            problem_id
        ],
    )?;

    if updated == 0 {
        return Err(StoreError::NotFound(problem_id));
    }
    Ok(())
}

/// Appends an attempt to the history log. Returns the attempt ID.
pub fn add_attempt(
    problem_id: i64,
    quality: i32,
    metrics: &AttemptMetrics,
    notes: Option<&str>,
    attempted_at: DateTime<Utc>,
    conn: &Connection,
) -> Result<i64> {
    conn.execute(
        "INSERT INTO attempts (problem_id, attempted_at, q, time_spent_min, hints_used, notes)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            problem_id,
            attempted_at,
            quality,
            metrics.time_spent_min,
            metrics.hints_used,
            notes
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Attempt history of one problem, oldest first
pub fn list_attempts(problem_id: i64, conn: &Connection) -> Result<Vec<Attempt>> {
    let mut stmt = conn.prepare(
        "SELECT id, problem_id, attempted_at, q, time_spent_min, hints_used, notes
         FROM attempts
         WHERE problem_id = ?1
         ORDER BY attempted_at ASC, id ASC",
    )?;

    let attempts = stmt
        .query_map(params![problem_id], |row| {
            Ok(Attempt {
                id: row.get(0)?,
                problem_id: row.get(1)?,
                attempted_at: row.get(2)?,
                quality: row.get(3)?,
                metrics: AttemptMetrics {
                    time_spent_min: row.get(4)?,
                    hints_used: row.get(5)?,
                },
                notes: row.get(6)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(attempts)
}

/// Grades a problem: reads its state, schedules the next review and records the attempt
///
/// Runs in one IMMEDIATE transaction so two gradings of the same problem
/// cannot both start from the same stale state.
pub fn grade_problem(
    problem_id: i64,
    quality: i32,
    metrics: &AttemptMetrics,
    notes: Option<&str>,
    today: NaiveDate,
    conn: &mut Connection,
) -> Result<ReviewState> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let problem = get_problem(problem_id, &tx)?.ok_or(StoreError::NotFound(problem_id))?;
    let new_state = schedule_after_attempt(&problem.review, quality, today);

    let now = Utc::now();
    let notes = notes.map(str::trim).filter(|n| !n.is_empty());
    update_problem_after_attempt(problem_id, &new_state, quality, metrics, now, &tx)?;
    add_attempt(problem_id, quality, metrics, notes, now, &tx)?;

    tx.commit()?;

    tracing::info!(
        problem_id,
        quality,
        next_review = %new_state.next_review_date,
        "attempt recorded"
    );
    Ok(new_state)
}

/// Deletes a problem together with its attempt history. Returns false if it did not exist.
pub fn delete_problem(problem_id: i64, conn: &Connection) -> Result<bool> {
    let deleted = conn.execute("DELETE FROM problems WHERE id = ?1", params![problem_id])?;
    Ok(deleted > 0)
}

pub fn problem_exists_with_url(url: &str, conn: &Connection) -> Result<bool> {
    let exists = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM problems WHERE url = ?1)",
        params![url.trim()],
        |row| row.get(0),
    )?;
    Ok(exists)
}

/// Counts problems and attempts for the summary panel
pub fn summary(today: NaiveDate, conn: &Connection) -> Result<Summary> {
    let total_problems: i64 =
        conn.query_row("SELECT COUNT(*) FROM problems", [], |row| row.get(0))?;
    let due_problems: i64 = conn.query_row(
        "SELECT COUNT(*) FROM problems WHERE next_review <= ?1",
        params![day_number(today)],
        |row| row.get(0),
    )?;
    let (total_attempts, lapses, average_quality): (i64, i64, Option<f64>) = conn.query_row(
        "SELECT COUNT(*), COALESCE(SUM(q < ?1), 0), AVG(q) FROM attempts",
        params![PASSING_QUALITY],
        |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
    )?;

    Ok(Summary {
        total_problems: total_problems as usize,
        due_problems: due_problems as usize,
        total_attempts: total_attempts as usize,
        lapses: lapses as usize,
        average_quality,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        conn
    }

    fn tags(list: &str) -> Vec<String> {
        parse_tags(list)
    }

    #[test]
    fn test_add_and_get_problem() {
        let conn = test_conn();
        let today = date(2024, 1, 1);

        let id = add_problem(
            "  Two Sum ",
            "https://leetcode.com/problems/two-sum/",
            &tags("arrays, hashing"),
            today,
            &conn,
        )
        .unwrap();

        let problem = get_problem(id, &conn).unwrap().unwrap();
        assert_eq!(problem.title, "Two Sum");
        assert_eq!(problem.tags, vec!["arrays", "hashing"]);
        assert_eq!(problem.review, ReviewState::new(today));
        assert_eq!(problem.last_quality, None);
        assert_eq!(problem.metrics, AttemptMetrics::default());
    }

    #[test]
    fn test_add_problem_requires_title_and_url() {
        let conn = test_conn();
        let today = date(2024, 1, 1);

        let result = add_problem("   ", "https://example.com", &[], today, &conn);
        assert!(matches!(result, Err(StoreError::InvalidInput(_))));

        let result = add_problem("Title", "", &[], today, &conn);
        assert!(matches!(result, Err(StoreError::InvalidInput(_))));

        assert!(list_problems(&conn).unwrap().is_empty());
    }

    #[test]
    fn test_get_missing_problem() {
        let conn = test_conn();
        assert!(get_problem(42, &conn).unwrap().is_none());
    }

    #[test]
    fn test_list_due_problems_order() {
        let conn = test_conn();
        let a = add_problem("A", "https://a", &[], date(2024, 1, 5), &conn).unwrap();
        let b = add_problem("B", "https://b", &[], date(2024, 1, 3), &conn).unwrap();
        let c = add_problem("C", "https://c", &[], date(2024, 1, 5), &conn).unwrap();
        add_problem("D", "https://d", &[], date(2024, 1, 9), &conn).unwrap();

        let due: Vec<i64> = list_due_problems(date(2024, 1, 5), &conn)
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(due, vec![b, a, c]);

        assert!(list_due_problems(date(2024, 1, 2), &conn).unwrap().is_empty());
    }

    #[test]
    fn test_grade_problem_persists_state_and_attempt() {
        let mut conn = test_conn();
        let today = date(2024, 1, 1);
        let id = add_problem("Two Sum", "https://two-sum", &[], today, &conn).unwrap();

        let metrics = AttemptMetrics {
            time_spent_min: Some(20),
            hints_used: Some(1),
        };
        let state = grade_problem(id, 5, &metrics, Some(" clean "), today, &mut conn).unwrap();
        assert_eq!(state.repetitions, 1);
        assert_eq!(state.next_review_date, date(2024, 1, 2));

        let problem = get_problem(id, &conn).unwrap().unwrap();
        assert_eq!(problem.review, state);
        assert_eq!(problem.last_quality, Some(5));
        assert_eq!(problem.metrics, metrics);
        assert!(problem.last_attempt_at.is_some());

        let attempts = list_attempts(id, &conn).unwrap();
        assert_eq!(attempts.len(), 1);
        assert_eq!(attempts[0].quality, 5);
        assert_eq!(attempts[0].metrics, metrics);
        assert_eq!(attempts[0].notes.as_deref(), Some("clean"));

        // no longer due today
        assert!(list_due_problems(today, &conn).unwrap().is_empty());
    }

    #[test]
    fn test_grade_sequence_follows_schedule() {
        let mut conn = test_conn();
        let id = add_problem("LRU Cache", "https://lru", &[], date(2024, 1, 1), &conn).unwrap();
        let none = AttemptMetrics::default();

        let s1 = grade_problem(id, 4, &none, None, date(2024, 1, 1), &mut conn).unwrap();
        let s2 = grade_problem(id, 4, &none, None, s1.next_review_date, &mut conn).unwrap();
        let s3 = grade_problem(id, 4, &none, None, s2.next_review_date, &mut conn).unwrap();
        let lapse = grade_problem(id, 1, &none, None, s3.next_review_date, &mut conn).unwrap();

        assert_eq!((s1.repetitions, s1.interval_days), (1, 1));
        assert_eq!((s2.repetitions, s2.interval_days), (2, 6));
        assert_eq!((s3.repetitions, s3.interval_days), (3, 15));
        assert_eq!((lapse.repetitions, lapse.interval_days), (0, 1));
        assert_eq!(lapse.next_review_date, date(2024, 1, 24));

        assert_eq!(list_attempts(id, &conn).unwrap().len(), 4);
    }

    #[test]
    fn test_far_future_review_is_not_due() {
        let mut conn = test_conn();
        let today = date(2024, 1, 1);
        let id = add_problem("Trie", "https://trie", &[], today, &conn).unwrap();

        let mature = ReviewState {
            ease_factor: 2.5,
            repetitions: 10,
            interval_days: 4_000_000,
            next_review_date: today,
        };
        let none = AttemptMetrics::default();
        update_problem_after_attempt(id, &mature, 5, &none, Utc::now(), &conn).unwrap();

        let state = grade_problem(id, 5, &none, None, today, &mut conn).unwrap();
        assert!(state.next_review_date.year() > 9999);

        let problem = get_problem(id, &conn).unwrap().unwrap();
        assert_eq!(problem.review.next_review_date, state.next_review_date);
        assert!(list_due_problems(today, &conn).unwrap().is_empty());
        assert_eq!(summary(today, &conn).unwrap().due_problems, 0);
        assert_eq!(list_due_problems(NaiveDate::MAX, &conn).unwrap().len(), 1);
    }

    #[test]
    fn test_due_order_spans_five_digit_years() {
        let conn = test_conn();
        let far = add_problem("Far", "https://far", &[], date(12000, 1, 1), &conn).unwrap();
        let near = add_problem("Near", "https://near", &[], date(9999, 12, 31), &conn).unwrap();

        let due: Vec<i64> = list_due_problems(date(12000, 1, 1), &conn)
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(due, vec![near, far]);
        assert!(list_due_problems(date(2024, 1, 1), &conn).unwrap().is_empty());
    }

    #[test]
    fn test_grade_missing_problem() {
        let mut conn = test_conn();
        let result = grade_problem(
            7,
            5,
            &AttemptMetrics::default(),
            None,
            date(2024, 1, 1),
            &mut conn,
        );
        assert!(matches!(result, Err(StoreError::NotFound(7))));

        let attempts: i64 = conn
            .query_row("SELECT COUNT(*) FROM attempts", [], |row| row.get(0))
            .unwrap();
        assert_eq!(attempts, 0);
    }

    #[test]
    fn test_delete_problem_cascades_attempts() {
        let mut conn = test_conn();
        let today = date(2024, 1, 1);
        let id = add_problem("Graph", "https://graph", &[], today, &conn).unwrap();
        grade_problem(id, 3, &AttemptMetrics::default(), None, today, &mut conn).unwrap();

        assert!(delete_problem(id, &conn).unwrap());
        assert!(!delete_problem(id, &conn).unwrap());
        assert!(list_attempts(id, &conn).unwrap().is_empty());
    }

    #[test]
    fn test_problem_exists_with_url() {
        let conn = test_conn();
        add_problem("A", "https://a", &[], date(2024, 1, 1), &conn).unwrap();

        assert!(problem_exists_with_url(" https://a ", &conn).unwrap());
        assert!(!problem_exists_with_url("https://b", &conn).unwrap());
    }

    #[test]
    fn test_summary() {
        let mut conn = test_conn();
        let today = date(2024, 1, 1);
        let none = AttemptMetrics::default();

        assert_eq!(summary(today, &conn).unwrap(), Summary::default());

        let a = add_problem("A", "https://a", &[], today, &conn).unwrap();
        add_problem("B", "https://b", &[], today, &conn).unwrap();
        grade_problem(a, 5, &none, None, today, &mut conn).unwrap();
        grade_problem(a, 2, &none, None, today, &mut conn).unwrap();

        let stats = summary(today, &conn).unwrap();
        assert_eq!(stats.total_problems, 2);
        assert_eq!(stats.due_problems, 1);
        assert_eq!(stats.total_attempts, 2);
        assert_eq!(stats.lapses, 1);
        assert_eq!(stats.average_quality, Some(3.5));
    }

    #[test]
    fn test_open_database_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tracker.db");

        let conn = open_database(&path).unwrap();
        add_problem("A", "https://a", &[], date(2024, 1, 1), &conn).unwrap();
        drop(conn);

        let conn = open_database(&path).unwrap();
        assert_eq!(list_problems(&conn).unwrap().len(), 1);
    }
}
