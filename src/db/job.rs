//! Job recording, loading, and updating
//!
//! A job is recorded right after the submit call returns its id, and updated once waiting on it
//! ends with a result or a failure. Cancelled waits leave the job as submitted: it is still
//! running remotely and can be resumed.

pub mod record;
pub mod load;
pub mod update;
pub mod state;
