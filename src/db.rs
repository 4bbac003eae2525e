//! Local ledger of submitted jobs, stored in SQLite
//!
//! A job id only lives on the server. Recording it here lets the CLI resume waiting after a
//! restart. The library client never touches the ledger.

/// Connect to a SQLite database
pub mod open;
pub mod job;
