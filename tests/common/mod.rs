#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use serde_json::{json, Value};
use tokio::time::Instant;
use url::Url;

use readlib_client::config::ClientConfig;
use readlib_client::error::{JobError, JobResult};
use readlib_client::job::cancel::CancelHandle;
use readlib_client::rpc::envelope::RpcContext;
use readlib_client::rpc::transport::RpcTransport;

/// A call as seen by the transport
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub method: String,
    pub params: Vec<Value>,
    pub context: Option<RpcContext>,
    pub at: Instant,
}

/// Transport answering calls from a fixed script, in order
pub struct ScriptedTransport {
    responses: Mutex<VecDeque<JobResult<Vec<Value>>>>,
    calls: Mutex<Vec<RecordedCall>>,
    cancel_on_call: Mutex<Option<(usize, CancelHandle)>>,
}

impl ScriptedTransport {
    pub fn new(responses: Vec<JobResult<Vec<Value>>>) -> Self {
        ScriptedTransport {
            responses: Mutex::new(responses.into()),
            calls: Mutex::new(Vec::new()),
            cancel_on_call: Mutex::new(None),
        }
    }

    /// Request cancellation while serving the n-th call (1-based), before answering it
    pub fn cancel_on_call(self, n: usize, handle: CancelHandle) -> Self {
        *self.cancel_on_call.lock().unwrap() = Some((n, handle));
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, suffix: &str) -> Vec<RecordedCall> {
        self.calls().into_iter().filter(|c| c.method.ends_with(suffix)).collect()
    }

    pub fn remaining(&self) -> usize {
        self.responses.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl RpcTransport for ScriptedTransport {
    async fn call(&self, method: &str, params: Vec<Value>, context: Option<RpcContext>) -> JobResult<Vec<Value>> {
        let count = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(RecordedCall { method: method.to_string(), params, context, at: Instant::now() });
            calls.len()
        };
        if let Some((n, handle)) = self.cancel_on_call.lock().unwrap().as_ref() {
            if *n == count {
                handle.cancel();
            }
        }
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(JobError::Transport(format!("script exhausted at call {count} ({method})"))))
    }
}

pub fn submitted(job_id: &str) -> JobResult<Vec<Value>> {
    Ok(vec![json!(job_id)])
}

pub fn pending() -> JobResult<Vec<Value>> {
    Ok(vec![json!({"finished": 0, "job_state": "in-progress"})])
}

pub fn finished(result: Value) -> JobResult<Vec<Value>> {
    Ok(vec![json!({"finished": 1, "job_state": "completed", "result": [result]})])
}

pub fn config(interval: Duration) -> ClientConfig {
    ClientConfig::builder(Url::parse("https://kbase.us/services/njs_wrapper").unwrap())
        .async_job_check_time(interval)
        .build()
        .unwrap()
}
