//! Asynchronous job protocol: submit, then poll until the remote job finishes
//!
//! From the client's side a job is either pending or finished. The server may track richer
//! states, but only the `finished` flag, the result list and an optional error are observed.

pub mod state;
pub mod cancel;
pub mod client;
