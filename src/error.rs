use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Failures talking to the place-search API
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("API error {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("API key not set (expected in ${0})")]
    MissingApiKey(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Failed to read fixture '{path}': {source}")]
    Fixture {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl FetchError {
    /// Whether retrying the same request could plausibly succeed
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Network(_) | FetchError::Timeout(_) | FetchError::Malformed(_) => true,
            FetchError::Status { status, .. } => matches!(*status, 408 | 429) || *status >= 500,
            FetchError::MissingApiKey(_)
            | FetchError::NotConfigured(_)
            | FetchError::Fixture { .. } => false,
        }
    }
}

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Corrupt cache entry '{key}': {reason}")]
    Corrupt { key: String, reason: String },
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("No candidate places found in any category")]
    EmptyCandidatePool,

    #[error("No categories to search")]
    NoCategories,

    #[error("Planning session was cancelled")]
    Cancelled,

    #[error("Failed to acquire semaphore: {0}")]
    Semaphore(#[from] tokio::sync::AcquireError),
}

#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to create output directory: {0}")]
    CreateDir(std::io::Error),

    #[error("Failed to write output: {0}")]
    Write(std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_transient() {
        assert!(FetchError::Timeout(Duration::from_secs(10)).is_transient());
        assert!(FetchError::Malformed("not json".into()).is_transient());
        assert!(FetchError::Status {
            status: 503,
            message: "unavailable".into()
        }
        .is_transient());
        assert!(FetchError::Status {
            status: 429,
            message: "slow down".into()
        }
        .is_transient());

        assert!(!FetchError::Status {
            status: 401,
            message: "unauthorized".into()
        }
        .is_transient());
        assert!(!FetchError::MissingApiKey("KAKAO_REST_API_KEY".into()).is_transient());
    }
}
