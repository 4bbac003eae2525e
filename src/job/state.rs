use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{JobError, JobResult, RemoteError};

/// Opaque handle issued by the remote submit call
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        JobId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One answer of the status endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct JobState<T> {
    /// Sent as 0/1 by most servers, occasionally as a boolean
    #[serde(default, deserialize_with = "finished_flag")]
    pub finished: bool,
    pub result: Option<Vec<T>>,
    #[serde(default)]
    pub error: Option<Value>,
    /// Server-side state label, informational only
    #[serde(default)]
    pub job_state: Option<String>,
}

impl<T> JobState<T> {
    /// `None` while the job is pending, the first result once it finished successfully
    ///
    /// An error reported by the job is never read as "still running", whatever `finished` says.
    pub fn into_outcome(self, id: &JobId) -> JobResult<Option<T>> {
        if let Some(error) = self.error.filter(|e| !e.is_null()) {
            return Err(JobError::RemoteJob(RemoteError::from_value(error)));
        }
        if !self.finished {
            return Ok(None);
        }
        match self.result.and_then(|r| r.into_iter().next()) {
            Some(result) => Ok(Some(result)),
            None => Err(JobError::Protocol(format!("job {id} finished without a result"))),
        }
    }
}

fn finished_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(false),
        Value::Bool(flag) => Ok(flag),
        Value::Number(n) => Ok(n.as_f64().map(|n| n != 0.0).unwrap_or(false)),
        other => Err(serde::de::Error::custom(format!("invalid finished flag {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn state(value: Value) -> JobState<Value> {
        serde_json::from_value(value).unwrap()
    }

    fn id() -> JobId {
        JobId::new("57f3cc11e4b0ad09e4b8e5a4")
    }

    #[test]
    fn finished_flag_accepts_numbers_and_booleans() {
        assert!(state(json!({"finished": 1})).finished);
        assert!(state(json!({"finished": true})).finished);
        assert!(!state(json!({"finished": 0})).finished);
        assert!(!state(json!({"finished": false})).finished);
        assert!(!state(json!({"finished": null})).finished);
        assert!(!state(json!({})).finished);
        assert!(serde_json::from_value::<JobState<Value>>(json!({"finished": "yes"})).is_err());
    }

    #[test]
    fn pending_has_no_outcome() {
        let outcome = state(json!({"finished": 0, "job_state": "running"})).into_outcome(&id()).unwrap();
        assert_eq!(outcome, None);
    }

    #[test]
    fn finished_returns_first_result() {
        let outcome = state(json!({"finished": 1, "result": [{"files": {}}, "second"]}))
            .into_outcome(&id())
            .unwrap();
        assert_eq!(outcome, Some(json!({"files": {}})));
    }

    #[test]
    fn finished_without_result_is_protocol_error() {
        let err = state(json!({"finished": 1, "result": []})).into_outcome(&id()).unwrap_err();
        assert!(matches!(err, JobError::Protocol(_)));

        let err = state(json!({"finished": 1})).into_outcome(&id()).unwrap_err();
        assert!(matches!(err, JobError::Protocol(_)));
    }

    #[test]
    fn error_is_reported_even_when_not_finished() {
        let err = state(json!({"finished": 0, "error": {"message": "boom"}})).into_outcome(&id()).unwrap_err();
        match err {
            JobError::RemoteJob(remote) => assert_eq!(remote.message.as_deref(), Some("boom")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn job_id_is_a_bare_string_on_the_wire() {
        assert_eq!(serde_json::to_value(id()).unwrap(), json!("57f3cc11e4b0ad09e4b8e5a4"));
        assert_eq!(id().to_string(), "57f3cc11e4b0ad09e4b8e5a4");
    }
}
