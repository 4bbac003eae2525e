//! Failure taxonomy for the job client
//!
//! Nothing in this crate retries. Every variant reaches the immediate caller of `submit`,
//! `poll_until_complete` or `submit_and_wait` so that a wrapping layer can decide what to do.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum JobError {
    /// Network, connection, timeout or authorization failure during an RPC call
    #[error("transport error: {0}")]
    Transport(String),

    /// The remote endpoint answered with a structurally invalid envelope
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The caller stopped waiting before the job finished
    #[error("cancelled while waiting for job {0}")]
    Cancelled(String),

    /// The remote call or the remote job itself reported a failure
    #[error("remote job failed: {0}")]
    RemoteJob(RemoteError),

    /// Client configuration rejected before any call was made
    #[error("configuration error: {0}")]
    Config(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<reqwest::Error> for JobError {
    fn from(err: reqwest::Error) -> Self {
        JobError::Transport(err.to_string())
    }
}

pub type JobResult<T> = Result<T, JobError>;

/// Error body as reported by the remote service, passed through unchanged
///
/// JSON-RPC 1.1 servers send `name`, `code`, `message` and put the server-side trace in `error`.
/// A failed job reports a value of the same shape in its status, but nothing guarantees it, so
/// the raw value is kept alongside the parsed fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RemoteError {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, rename = "error")]
    pub data: Option<Value>,
    #[serde(skip)]
    pub raw: Value,
}

impl RemoteError {
    /// Build from whatever the service put in an `error` member
    pub fn from_value(value: Value) -> Self {
        let parsed = match &value {
            Value::Object(fields) => RemoteError {
                name: fields.get("name").and_then(Value::as_str).map(str::to_string),
                code: fields.get("code").and_then(|code| match code {
                    Value::String(code) => code.trim().parse().ok(),
                    code => code.as_i64(),
                }),
                message: fields.get("message").and_then(Value::as_str).map(str::to_string),
                data: fields.get("error").filter(|data| !data.is_null()).cloned(),
                ..Default::default()
            },
            Value::String(message) => RemoteError { message: Some(message.clone()), ..Default::default() },
            _ => RemoteError::default(),
        };
        RemoteError { raw: value, ..parsed }
    }
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = self.name.as_deref().unwrap_or("JSONRPCError");
        match (&self.code, &self.message) {
            (Some(code), Some(message)) => write!(f, "{name} ({code}): {message}"),
            (None, Some(message)) => write!(f, "{name}: {message}"),
            _ => write!(f, "{name}: {}", self.raw),
        }
    }
}
