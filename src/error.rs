//! Error types for Pathik

use thiserror::Error;

/// Pathik error type
#[derive(Error, Debug)]
pub enum PathikError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected HTTP status: {0}")]
    Status(u16),

    #[error("Malformed response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Request to {endpoint} failed after {attempts} attempts")]
    RequestFailed { endpoint: String, attempts: u32 },

    #[error("Network link is down")]
    LinkDown,

    #[error("Restart limit reached after {0} restarts")]
    RestartLimit(u32),

    #[error("Signal handler error: {0}")]
    Signal(#[from] ctrlc::Error),
}

impl From<toml::de::Error> for PathikError {
    fn from(e: toml::de::Error) -> Self {
        PathikError::Config(e.to_string())
    }
}

impl PathikError {
    /// True for errors where the service answered but the body was unusable.
    pub fn is_decode(&self) -> bool {
        matches!(self, PathikError::Decode(_))
    }
}

pub type Result<T> = std::result::Result<T, PathikError>;
