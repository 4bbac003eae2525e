use std::str::FromStr;

use log::info;
use rusqlite::{Connection, OptionalExtension, Row};
use serde_json::Value;

use crate::db::job::state::JobState;
use crate::job::state::JobId;

/// One ledger row
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerEntry {
    pub job_id: JobId,
    pub method: String,
    pub params: Value,
    pub submitted_at: String,
    pub state: JobState,
    pub result: Option<Value>,
    pub error: Option<String>,
    pub updated_at: Option<String>,
}

const COLUMNS: &str = "job_id, method, params, submitted_at, state, result, error, updated_at";

pub fn get_jobs(conn: &Connection, pending_only: bool) -> rusqlite::Result<Vec<LedgerEntry>> {
    let filter = match pending_only {
        true => "WHERE state = 'submitted'",
        false => "",
    };
    let mut stmt = conn.prepare(&format!("SELECT {COLUMNS} FROM job {filter} ORDER BY submitted_at, job_id"))?;
    let rows = stmt.query_map([], from_row)?;

    let mut jobs: Vec<LedgerEntry> = Vec::new();
    for row in rows {
        jobs.push(row?);
    }
    info!("Loaded {} jobs from ledger", jobs.len());
    Ok(jobs)
}

pub fn get_job(conn: &Connection, job_id: &JobId) -> rusqlite::Result<Option<LedgerEntry>> {
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM job WHERE job_id = ?1"),
        [job_id.as_str()],
        from_row,
    )
    .optional()
}

fn from_row(row: &Row) -> rusqlite::Result<LedgerEntry> {
    let state: String = row.get(4)?;
    let params: String = row.get(2)?;
    let result: Option<String> = row.get(5)?;

    Ok(LedgerEntry {
        job_id: JobId::new(row.get::<_, String>(0)?),
        method: row.get(1)?,
        params: deserialise(2, &params)?,
        submitted_at: row.get(3)?,
        state: JobState::from_str(&state).map_err(|err| {
            rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, err.into())
        })?,
        result: result.map(|r| deserialise(5, &r)).transpose()?,
        error: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

fn deserialise(column: usize, json: &str) -> rusqlite::Result<Value> {
    serde_json::from_str(json)
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, Box::new(err)))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::db::job::record::{ensure_recorded, record_submission};
    use crate::db::job::update::mark_finished;
    use crate::db::open::open_in_memory;

    #[test]
    fn pending_filter() {
        let conn = open_in_memory().unwrap();
        record_submission(&conn, &JobId::new("a"), "m._op_submit", &json!({"n": 1})).unwrap();
        record_submission(&conn, &JobId::new("b"), "m._op_submit", &json!({"n": 2})).unwrap();
        mark_finished(&conn, &JobId::new("a"), &json!({"files": {}})).unwrap();

        let all = get_jobs(&conn, false).unwrap();
        assert_eq!(all.len(), 2);

        let pending = get_jobs(&conn, true).unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].job_id, JobId::new("b"));
        assert_eq!(pending[0].params, json!({"n": 2}));
        assert_eq!(pending[0].state, JobState::Submitted);
    }

    #[test]
    fn missing_job() {
        let conn = open_in_memory().unwrap();
        assert_eq!(get_job(&conn, &JobId::new("none")).unwrap(), None);
    }

    #[test]
    fn ensure_recorded_inserts_once() {
        let conn = open_in_memory().unwrap();
        let id = JobId::new("external");
        assert!(ensure_recorded(&conn, &id, "m._op_submit").unwrap());
        assert!(!ensure_recorded(&conn, &id, "m._op_submit").unwrap());

        let entry = get_job(&conn, &id).unwrap().unwrap();
        assert_eq!(entry.params, Value::Null);
        assert_eq!(entry.result, None);
    }
}
