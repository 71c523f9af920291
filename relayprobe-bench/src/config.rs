use clap::ValueEnum;
use thiserror::Error;
use url::Url;

pub const DEFAULT_RELAY_URL: &str = "ws://localhost:8080";

/// Which drivers a run executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TestMode {
    Sequential,
    Parallel,
    /// Sequential first, then parallel, each with its own result set.
    Both,
}

impl TestMode {
    pub fn includes_sequential(self) -> bool {
        matches!(self, TestMode::Sequential | TestMode::Both)
    }

    pub fn includes_parallel(self) -> bool {
        matches!(self, TestMode::Parallel | TestMode::Both)
    }

    pub fn as_name(self) -> &'static str {
        match self {
            TestMode::Sequential => "sequential",
            TestMode::Parallel => "parallel",
            TestMode::Both => "both",
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid relay URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Unsupported scheme {0:?}: relay URL must start with ws:// or wss://")]
    UnsupportedScheme(String),

    #[error("Batch size must be at least 1")]
    ZeroBatchSize,
}

/// Validate a relay endpoint before any probing starts.
pub fn parse_relay_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw).map_err(|e| ConfigError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;
    match url.scheme() {
        "ws" | "wss" => {}
        other => return Err(ConfigError::UnsupportedScheme(other.to_string())),
    }
    if url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl { url: raw.to_string(), reason: "missing host".to_string() });
    }
    Ok(url)
}

/// Reject a parallel batch size of zero.
pub fn check_batch_size(batch_size: usize) -> Result<usize, ConfigError> {
    if batch_size == 0 {
        return Err(ConfigError::ZeroBatchSize);
    }
    Ok(batch_size)
}
