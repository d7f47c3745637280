//! Reset attempt audit log.

use chrono::Utc;
use rusqlite::params;
use serde::Serialize;

use super::{failed_phase, ResetPhase, ResetStatus};
use crate::db::Db;
use crate::error::{Result, SocialGraphError};

/// One row of `reset_log`.
#[derive(Debug, Clone, Serialize)]
pub struct ResetLogEntry {
    pub reset_id: String,
    pub timestamp: String,
    pub requested_count: i64,
    pub outcome: String,
    pub written_count: i64,
    pub error_message: Option<String>,
}

fn outcome_of(result: &Result<ResetStatus>) -> (&'static str, usize, Option<String>) {
    match result {
        Ok(status) => ("done", status.written, None),
        Err(e) => match failed_phase(e) {
            Some(ResetPhase::Clearing) => ("clear_failed", 0, Some(e.to_string())),
            _ => ("fill_failed", 0, Some(e.to_string())),
        },
    }
}

/// Log a reset attempt with its terminal state.
pub async fn record(
    db: &Db,
    reset_id: &str,
    requested: usize,
    result: &Result<ResetStatus>,
) -> Result<()> {
    let (outcome, written, error_message) = outcome_of(result);
    let timestamp = Utc::now().to_rfc3339();
    let reset_id = reset_id.to_string();

    db.with_connection(move |conn| {
        conn.execute(
            r#"
            INSERT INTO reset_log (
                reset_id, timestamp, requested_count, outcome, written_count, error_message
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                reset_id,
                timestamp,
                requested as i64,
                outcome,
                written as i64,
                error_message
            ],
        )?;
        Ok::<(), SocialGraphError>(())
    })
    .await
}

/// Most recent reset attempts, newest first.
pub async fn recent_resets(db: &Db, limit: usize) -> Result<Vec<ResetLogEntry>> {
    let limit = limit as i64;
    db.with_connection(move |conn| {
        let mut stmt = conn.prepare(
            "SELECT reset_id, timestamp, requested_count, outcome, written_count, error_message \
             FROM reset_log ORDER BY timestamp DESC, rowid DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map([limit], |row| {
            Ok(ResetLogEntry {
                reset_id: row.get(0)?,
                timestamp: row.get(1)?,
                requested_count: row.get(2)?,
                outcome: row.get(3)?,
                written_count: row.get(4)?,
                error_message: row.get(5)?,
            })
        })?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    })
    .await
}
