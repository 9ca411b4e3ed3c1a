//! JSON import/export module for the problem list.
//! Saves problems with their attempt history and loads them back as new problems.

use crate::database::{StoreError, db};
use crate::models::problem::parse_tags;
use crate::models::{Attempt, Problem};
use chrono::NaiveDate;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// One exported problem together with its attempt log.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProblemExport {
    pub problem: Problem,
    #[serde(default)]
    pub attempts: Vec<Attempt>,
}

/// Collects every problem and its history from the database.
pub fn collect_exports(conn: &Connection) -> Result<Vec<ProblemExport>, ExportError> {
    db::list_problems(conn)?
        .into_iter()
        .map(|problem| {
            let attempts = db::list_attempts(problem.id, conn)?;
            Ok::<_, ExportError>(ProblemExport { problem, attempts })
        })
        .collect()
}

/// Exports problems to a JSON file at the specified path.
pub fn export_json_to_path(
    exports: &[ProblemExport],
    path: impl AsRef<Path>,
) -> Result<(), ExportError> {
    let json_string = serde_json::to_string_pretty(exports)?;
    let mut file = File::create(path.as_ref())?;
    file.write_all(json_string.as_bytes())?;

    tracing::info!(count = exports.len(), path = %path.as_ref().display(), "problems exported");
    Ok(())
}

/// Reads problems from a JSON file.
/// Returns an error if the file doesn't exist or contains invalid JSON.
pub fn import_json(path: impl AsRef<Path>) -> Result<Vec<ProblemExport>, ExportError> {
    let mut file = File::open(path.as_ref())?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;

    let exports: Vec<ProblemExport> = serde_json::from_str(&contents)?;
    Ok(exports)
}

/// Registers imported problems as new ones due on `today`.
///
/// Review state and history are not carried over. Problems whose URL already exists are skipped.
/// The whole file is imported in one transaction: an invalid entry leaves the database untouched.
/// Returns how many problems were added.
pub fn import_into(
    exports: &[ProblemExport],
    today: NaiveDate,
    conn: &mut Connection,
) -> Result<usize, ExportError> {
    let tx = conn.transaction().map_err(StoreError::from)?;

    let mut imported = 0;
    for export in exports {
        let problem = &export.problem;
        if db::problem_exists_with_url(&problem.url, &tx)? {
            tracing::debug!(url = %problem.url, "skipping duplicate problem");
            continue;
        }
        // re-normalize in case the file was edited by hand
        let tags = parse_tags(&problem.tags.join(","));
        db::add_problem(&problem.title, &problem.url, &tags, today, &tx)?;
        imported += 1;
    }

    tx.commit().map_err(StoreError::from)?;

    tracing::info!(imported, skipped = exports.len() - imported, "problems imported");
    Ok(imported)
}
