use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::config::ClientConfig;
use crate::error::{JobError, JobResult};
use crate::job::cancel::Cancellation;
use crate::job::state::{JobId, JobState};
use crate::rpc::envelope::RpcContext;
use crate::rpc::transport::RpcTransport;

/// Submits long-running calls of one remote module and waits for their results
///
/// Status checks for one job are strictly sequential, with a fixed sleep between them. Separate
/// jobs can be awaited concurrently from the same client, nothing mutable is shared.
///
/// ```no_run
/// # use std::sync::Arc;
/// # use readlib_client::config::ClientConfig;
/// # use readlib_client::job::{cancel::Cancellation, client::AsyncJobClient};
/// # use readlib_client::rpc::transport::HttpTransport;
/// # async fn run(config: ClientConfig, params: serde_json::Value) -> readlib_client::error::JobResult<()> {
/// let transport = Arc::new(HttpTransport::new(&config)?);
/// let client = AsyncJobClient::new(transport, "kb_read_library_to_file", &config);
/// let output: serde_json::Value = client
///     .submit_and_wait("convert_read_library_to_file", &params, &mut Cancellation::never())
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct AsyncJobClient {
    transport: Arc<dyn RpcTransport>,
    module: String,
    check_interval: Duration,
    async_version: Option<String>,
}

impl AsyncJobClient {
    pub fn new(transport: Arc<dyn RpcTransport>, module: &str, config: &ClientConfig) -> Self {
        AsyncJobClient {
            transport,
            module: module.to_string(),
            check_interval: config.async_job_check_time(),
            async_version: config.async_version().map(str::to_string),
        }
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn check_interval(&self) -> Duration {
        self.check_interval
    }

    pub async fn submit<P>(&self, operation: &str, request: &P) -> JobResult<JobId>
    where
        P: Serialize + ?Sized,
    {
        self.submit_with_context(operation, request, None).await
    }

    /// Submit with a caller-supplied context; the configured service version is added to it
    pub async fn submit_with_context<P>(&self, operation: &str, request: &P, context: Option<RpcContext>) -> JobResult<JobId>
    where
        P: Serialize + ?Sized,
    {
        let method = format!("{}._{}_submit", self.module, operation);
        let params = vec![serde_json::to_value(request)?];

        let context = match (&self.async_version, context) {
            (Some(version), context) => {
                let mut context = context.unwrap_or_default();
                context.service_ver = Some(version.clone());
                Some(context)
            }
            (None, context) => context,
        };

        let values = self.transport.call(&method, params, context).await?;
        let job_id = match values.into_iter().next() {
            Some(Value::String(id)) => JobId::new(id),
            Some(other) => {
                return Err(JobError::Protocol(format!("{method} returned {other} instead of a job id")));
            }
            None => {
                return Err(JobError::Protocol(format!("{method} returned an empty result list")));
            }
        };

        info!("Submitted {method}, job id {job_id}");
        Ok(job_id)
    }

    /// One status check, no waiting
    ///
    /// The result stays untyped so a reported failure is never masked by a result that does
    /// not deserialize.
    pub async fn check_job(&self, id: &JobId) -> JobResult<JobState<Value>> {
        let method = format!("{}._check_job", self.module);
        let values = self.transport
            .call(&method, vec![Value::String(id.to_string())], None)
            .await?;

        let state = values
            .into_iter()
            .next()
            .ok_or_else(|| JobError::Protocol(format!("{method} returned an empty result list")))?;

        serde_json::from_value::<JobState<Value>>(state)
            .map_err(|err| JobError::Protocol(format!("malformed job state for {id}: {err}")))
    }

    /// Check the job until it reports finished, sleeping the check interval in between
    ///
    /// The first check goes out immediately. There is no overall deadline: cancel through
    /// `cancel` to stop waiting. The remote job keeps running either way.
    pub async fn poll_until_complete<R>(&self, id: &JobId, cancel: &mut Cancellation) -> JobResult<R>
    where
        R: DeserializeOwned,
    {
        let mut checks: u64 = 0;
        loop {
            if cancel.is_cancelled() {
                warn!("Stopped waiting for job {id} after {checks} status checks");
                return Err(JobError::Cancelled(id.to_string()));
            }

            checks += 1;
            let state = self.check_job(id).await?;
            debug!("Job {id} check {checks}: finished={} state={:?}", state.finished, state.job_state);

            if let Some(result) = state.into_outcome(id)? {
                info!("Job {id} finished after {checks} status checks");
                return serde_json::from_value::<R>(result)
                    .map_err(|err| JobError::Protocol(format!("unexpected result of job {id}: {err}")));
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    warn!("Stopped waiting for job {id} after {checks} status checks");
                    return Err(JobError::Cancelled(id.to_string()));
                }
                _ = tokio::time::sleep(self.check_interval) => {}
            }
        }
    }

    pub async fn submit_and_wait<P, R>(&self, operation: &str, request: &P, cancel: &mut Cancellation) -> JobResult<R>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let id = self.submit(operation, request).await?;
        self.poll_until_complete(&id, cancel).await
    }

    /// Plain synchronous call of `<module>.<function>`
    pub async fn call(&self, function: &str, params: Vec<Value>) -> JobResult<Vec<Value>> {
        let method = format!("{}.{}", self.module, function);
        self.transport.call(&method, params, None).await
    }
}
