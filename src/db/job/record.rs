use chrono::Utc;
use log::info;
use rusqlite::Connection;
use serde_json::Value;

use crate::job::state::JobId;

/// Store a freshly submitted job
pub fn record_submission(conn: &Connection, job_id: &JobId, method: &str, params: &Value) -> rusqlite::Result<()> {
    info!("Recording job {job_id} ({method}) in ledger");
    conn.execute(
        "INSERT OR REPLACE INTO job (job_id, method, params, submitted_at, state) VALUES (?1, ?2, ?3, ?4, 'submitted')",
        (job_id.as_str(), method, params.to_string(), Utc::now().to_rfc3339()),
    )?;
    Ok(())
}

/// Make sure a job submitted elsewhere has a row, so its outcome can be stored
pub fn ensure_recorded(conn: &Connection, job_id: &JobId, method: &str) -> rusqlite::Result<bool> {
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO job (job_id, method, submitted_at) VALUES (?1, ?2, ?3)",
        (job_id.as_str(), method, Utc::now().to_rfc3339()),
    )?;
    if inserted > 0 {
        info!("Job {job_id} was not in the ledger, added it");
    }
    Ok(inserted > 0)
}
