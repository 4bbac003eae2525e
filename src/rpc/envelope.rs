use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{JobError, JobResult, RemoteError};

pub const RPC_VERSION: &str = "1.1";

/// Out-of-band context sent next to the positional parameters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RpcContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_ver: Option<String>,
    #[serde(flatten)]
    pub additional_properties: Map<String, Value>,
}

impl RpcContext {
    pub fn with_service_ver(version: &str) -> Self {
        RpcContext { service_ver: Some(version.to_string()), ..Default::default() }
    }
}

#[derive(Debug, Serialize)]
pub struct RpcRequest<'a> {
    pub version: &'static str,
    pub method: &'a str,
    pub params: Vec<Value>,
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<RpcContext>,
}

impl<'a> RpcRequest<'a> {
    pub fn new(method: &'a str, params: Vec<Value>, context: Option<RpcContext>) -> Self {
        RpcRequest { version: RPC_VERSION, method, params, id: request_id(), context }
    }
}

/// Random numeric id, only used to correlate server logs
fn request_id() -> String {
    let id: u64 = rand::thread_rng().gen_range(1_000_000_000..u64::MAX);
    id.to_string()
}

#[derive(Debug, Deserialize)]
pub struct RpcResponse {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<Value>,
}

impl RpcResponse {
    /// Unwrap the envelope into the list of return values
    pub fn into_result(self) -> JobResult<Vec<Value>> {
        if let Some(error) = self.error.filter(|e| !e.is_null()) {
            return Err(JobError::RemoteJob(RemoteError::from_value(error)));
        }
        match self.result {
            Some(Value::Array(values)) => Ok(values),
            Some(Value::Null) | None => Ok(Vec::new()),
            Some(other) => Err(JobError::Protocol(format!("expected a result list, got {other}"))),
        }
    }
}
