use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Submitted,
    Finished,
    Failed
}

/// Ledger view of a job
///
/// Only terminal outcomes observed by this client are recorded. A job stays submitted while
/// nobody is waiting on it, even if the server finished it long ago.
impl JobState {
    /// stored in the `state` column
    pub fn to_string(&self) -> &str {
        match self {
            JobState::Submitted => "submitted",
            JobState::Finished => "finished",
            JobState::Failed => "failed"
        }
    }
}

impl FromStr for JobState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "submitted" => Ok(JobState::Submitted),
            "finished" => Ok(JobState::Finished),
            "failed" => Ok(JobState::Failed),
            other => Err(format!("unknown job state {other}"))
        }
    }
}
