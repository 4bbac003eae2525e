use chrono::Utc;
use log::info;
use rusqlite::Connection;
use serde_json::Value;

use crate::db::job::state::JobState;
use crate::job::state::JobId;

pub fn mark_finished(conn: &Connection, job_id: &JobId, result: &Value) -> rusqlite::Result<()> {
    update(conn, job_id, JobState::Finished, Some(result.to_string()), None)
}

pub fn mark_failed(conn: &Connection, job_id: &JobId, error: &str) -> rusqlite::Result<()> {
    update(conn, job_id, JobState::Failed, None, Some(error.to_string()))
}

fn update(conn: &Connection, job_id: &JobId, state: JobState, result: Option<String>, error: Option<String>) -> rusqlite::Result<()> {
    let col = state.to_string();
    info!("Updating {job_id} with state {col}");
    let changed = conn.execute(
        "UPDATE job SET state = ?1, result = ?2, error = ?3, updated_at = ?4 WHERE job_id = ?5",
        (col, result, error, Utc::now().to_rfc3339(), job_id.as_str()),
    )?;
    if changed == 0 {
        return Err(rusqlite::Error::QueryReturnedNoRows);
    }
    Ok(())
}
