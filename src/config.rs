//! Immutable client configuration
//!
//! Everything the transport and the poll loop read is fixed when the client is constructed.
//! Several poll loops can share one `ClientConfig` without locking.

use std::time::Duration;

use url::Url;

use crate::error::{JobError, JobResult};

/// Interval between status checks when nothing else is configured
pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_millis(5000);

/// Service version tag sent with every submission by default
pub const DEFAULT_ASYNC_VERSION: &str = "release";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    url: Url,
    token: Option<String>,
    read_timeout: Option<Duration>,
    insecure_http_allowed: bool,
    trust_all_certificates: bool,
    streaming_mode: bool,
    async_job_check_time: Duration,
    async_version: Option<String>,
}

impl ClientConfig {
    pub fn builder(url: Url) -> ClientConfigBuilder {
        ClientConfigBuilder {
            config: ClientConfig {
                url,
                token: None,
                read_timeout: None,
                insecure_http_allowed: false,
                trust_all_certificates: false,
                streaming_mode: false,
                async_job_check_time: DEFAULT_CHECK_INTERVAL,
                async_version: Some(DEFAULT_ASYNC_VERSION.to_string()),
            }
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn read_timeout(&self) -> Option<Duration> {
        self.read_timeout
    }

    pub fn insecure_http_allowed(&self) -> bool {
        self.insecure_http_allowed
    }

    pub fn trust_all_certificates(&self) -> bool {
        self.trust_all_certificates
    }

    pub fn streaming_mode(&self) -> bool {
        self.streaming_mode
    }

    pub fn async_job_check_time(&self) -> Duration {
        self.async_job_check_time
    }

    pub fn async_version(&self) -> Option<&str> {
        self.async_version.as_deref()
    }
}

pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.config.token = Some(token.into());
        self
    }

    /// Zero means no timeout
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.config.read_timeout = if timeout.is_zero() { None } else { Some(timeout) };
        self
    }

    pub fn insecure_http_allowed(mut self, allowed: bool) -> Self {
        self.config.insecure_http_allowed = allowed;
        self
    }

    /// Trust every certificate, self-signed ones included
    pub fn trust_all_certificates(mut self, trust_all: bool) -> Self {
        self.config.trust_all_certificates = trust_all;
        self
    }

    /// Send request bodies in chunks instead of one buffered body. Many servers don't accept this.
    pub fn streaming_mode(mut self, streaming: bool) -> Self {
        self.config.streaming_mode = streaming;
        self
    }

    pub fn async_job_check_time(mut self, interval: Duration) -> Self {
        self.config.async_job_check_time = interval;
        self
    }

    /// `None` submits without a service version context
    pub fn async_version(mut self, version: Option<String>) -> Self {
        self.config.async_version = version;
        self
    }

    pub fn build(self) -> JobResult<ClientConfig> {
        let config = self.config;
        match config.url.scheme() {
            "https" => {}
            "http" => {
                if config.token.is_some() && !config.insecure_http_allowed {
                    return Err(JobError::Config(format!(
                        "refusing to send credentials over insecure connection to {}; allow insecure http to override",
                        config.url
                    )));
                }
            }
            other => {
                return Err(JobError::Config(format!("unsupported URL scheme {other}")));
            }
        }
        if config.async_job_check_time.is_zero() {
            return Err(JobError::Config("job check interval must be greater than zero".to_string()));
        }
        Ok(config)
    }
}
