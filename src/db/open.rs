use log::info;
use rusqlite::Connection;

use crate::WorkingDirectory;

static SCHEMA: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/data/db/schema.sql"));

pub fn open_db(wd: &WorkingDirectory) -> rusqlite::Result<Connection> {
    let path = &wd.path.join("readlib.db");
    if !path.exists() { info!("Creating new job ledger {}", path.display()) }
    let conn = Connection::open(path)?;
    conn.execute_batch(SCHEMA)?;

    Ok(conn)
}

/// Throwaway ledger with the same schema
pub fn open_in_memory() -> rusqlite::Result<Connection> {
    let conn = Connection::open_in_memory()?;
    conn.execute_batch(SCHEMA)?;
    Ok(conn)
}
