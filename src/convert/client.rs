use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::ClientConfig;
use crate::convert::output::ConvertReadLibraryOutput;
use crate::convert::params::ConvertReadLibraryParams;
use crate::error::{JobError, JobResult};
use crate::job::cancel::Cancellation;
use crate::job::client::AsyncJobClient;
use crate::job::state::JobId;
use crate::rpc::transport::{HttpTransport, RpcTransport};

pub const MODULE_NAME: &str = "kb_read_library_to_file";
pub const CONVERT_OPERATION: &str = "convert_read_library_to_file";

/// Answer of the synchronous `status` method
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceStatus {
    pub state: String,
    #[serde(default)]
    pub message: String,
    pub version: String,
    pub git_url: String,
    pub git_commit_hash: String,
}

pub struct ReadLibraryToFileClient {
    jobs: AsyncJobClient,
}

impl ReadLibraryToFileClient {
    /// Client over HTTP, configured entirely by `config`
    pub fn connect(config: &ClientConfig) -> JobResult<Self> {
        let transport = Arc::new(HttpTransport::new(config)?);
        Ok(Self::with_transport(transport, config))
    }

    pub fn with_transport(transport: Arc<dyn RpcTransport>, config: &ClientConfig) -> Self {
        ReadLibraryToFileClient { jobs: AsyncJobClient::new(transport, MODULE_NAME, config) }
    }

    pub fn jobs(&self) -> &AsyncJobClient {
        &self.jobs
    }

    /// Convert read libraries to files and wait for the outcome
    pub async fn convert_read_library_to_file(
        &self,
        params: &ConvertReadLibraryParams,
        cancel: &mut Cancellation,
    ) -> JobResult<ConvertReadLibraryOutput> {
        self.jobs.submit_and_wait(CONVERT_OPERATION, params, cancel).await
    }

    pub async fn submit(&self, params: &ConvertReadLibraryParams) -> JobResult<JobId> {
        self.jobs.submit(CONVERT_OPERATION, params).await
    }

    /// Resume waiting on a conversion submitted earlier, possibly by another process
    pub async fn wait(&self, id: &JobId, cancel: &mut Cancellation) -> JobResult<ConvertReadLibraryOutput> {
        self.jobs.poll_until_complete(id, cancel).await
    }

    pub async fn status(&self) -> JobResult<ServiceStatus> {
        let values = self.jobs.call("status", Vec::new()).await?;
        let status = values
            .into_iter()
            .next()
            .ok_or_else(|| JobError::Protocol(format!("{MODULE_NAME}.status returned an empty result list")))?;
        serde_json::from_value(status)
            .map_err(|err| JobError::Protocol(format!("malformed status from {MODULE_NAME}: {err}")))
    }
}
