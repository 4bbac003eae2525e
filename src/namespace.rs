use std::fmt;
use clap::ValueEnum;

/// Deployment the client talks to when no explicit service URL is given
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub enum PlatformNamespace {
    Dev,
    Test,
    Prod
}

impl PlatformNamespace {
    /// Job service endpoint that accepts `_submit` and `_check_job` calls
    pub fn service_url(&self) -> &'static str {
        match self {
            PlatformNamespace::Dev => "https://ci.kbase.us/services/njs_wrapper",
            PlatformNamespace::Test => "https://appdev.kbase.us/services/njs_wrapper",
            PlatformNamespace::Prod => "https://kbase.us/services/njs_wrapper"
        }
    }
}

impl fmt::Display for PlatformNamespace {
      fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PlatformNamespace::Dev => write!(f, "dev"),
            PlatformNamespace::Test => write!(f, "test"),
            PlatformNamespace::Prod => write!(f, "prod")
        }
    }
}
