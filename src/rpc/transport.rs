use bytes::Bytes;
use log::{debug, warn};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use serde_json::Value;
use url::Url;

use crate::config::ClientConfig;
use crate::error::{JobError, JobResult};
use crate::rpc::envelope::{RpcContext, RpcRequest, RpcResponse};

/// Chunk size used when streaming a request body
const STREAM_CHUNK_SIZE: usize = 8 * 1024;

/// Longest slice of an unparseable body quoted back in an error
const BODY_SNIPPET_LEN: usize = 200;

/// Calls one remote method and returns its list of return values
///
/// Implementations must not retry: a failed call is reported once, as is.
#[async_trait::async_trait]
pub trait RpcTransport: Send + Sync {
    async fn call(&self, method: &str, params: Vec<Value>, context: Option<RpcContext>) -> JobResult<Vec<Value>>;
}

/// JSON-RPC 1.1 over HTTP POST
pub struct HttpTransport {
    client: reqwest::Client,
    url: Url,
    token: Option<String>,
    streaming_mode: bool,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> JobResult<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.read_timeout() {
            builder = builder.timeout(timeout);
        }
        if config.trust_all_certificates() {
            warn!("Trusting all TLS certificates for {}", config.url());
            builder = builder.danger_accept_invalid_certs(true);
        }

        Ok(HttpTransport {
            client: builder.build()?,
            url: config.url().clone(),
            token: config.token().map(str::to_string),
            streaming_mode: config.streaming_mode(),
        })
    }

    fn body(&self, payload: Vec<u8>) -> reqwest::Body {
        if !self.streaming_mode {
            return reqwest::Body::from(payload);
        }
        let chunks: Vec<Result<Bytes, std::io::Error>> = payload
            .chunks(STREAM_CHUNK_SIZE)
            .map(|chunk| Ok(Bytes::copy_from_slice(chunk)))
            .collect();
        reqwest::Body::wrap_stream(futures::stream::iter(chunks))
    }
}

#[async_trait::async_trait]
impl RpcTransport for HttpTransport {
    async fn call(&self, method: &str, params: Vec<Value>, context: Option<RpcContext>) -> JobResult<Vec<Value>> {
        let request = RpcRequest::new(method, params, context);
        let payload = serde_json::to_vec(&request)?;
        debug!("POST {} method={} id={} bytes={}", self.url, method, request.id, payload.len());

        let mut http = self.client
            .post(self.url.clone())
            .header(CONTENT_TYPE, "application/json")
            .body(self.body(payload));
        if let Some(token) = &self.token {
            http = http.header(AUTHORIZATION, token.as_str());
        }

        let response = http.send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(JobError::Transport(format!("unauthorized ({status}) calling {method}: {}", snippet(&body))));
        }

        // JSON-RPC servers report errors with HTTP 500 and a regular envelope, so parse first
        match serde_json::from_slice::<RpcResponse>(&body) {
            Ok(envelope) => envelope.into_result(),
            Err(err) if status.is_success() => {
                Err(JobError::Protocol(format!("malformed response to {method}: {err}")))
            }
            Err(_) => {
                Err(JobError::Transport(format!("server responded {status} to {method}: {}", snippet(&body))))
            }
        }
    }
}

fn snippet(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    text.chars().take(BODY_SNIPPET_LEN).collect()
}
