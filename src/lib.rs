//! Client for the `kb_read_library_to_file` conversion service
//!
//! Conversions run as asynchronous jobs on the server: a request is submitted, the returned job
//! id is polled at a fixed interval, and the first successful result is returned. The protocol
//! itself lives in [`job`] and is independent of this particular service; [`convert`] binds it
//! to the service's method names and types.

use std::path::PathBuf;

pub mod config;
pub mod convert;
pub mod db;
pub mod error;
pub mod job;
pub mod namespace;
pub mod request;
pub mod rpc;

/// Directory holding the job ledger
pub struct WorkingDirectory {
    pub path: PathBuf,
}
