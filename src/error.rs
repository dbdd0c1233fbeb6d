use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("GitHub API request failed with status {status}: {message}")]
    UpstreamError { status: u16, message: String },

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("Database error: {0}")]
    DatabaseError(#[from] surrealdb::Error),

    #[error("Storage error: {0}")]
    StoreError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Sync timed out after {0:?}")]
    Timeout(Duration),
}

impl SyncError {
    /// HTTP status of an upstream failure, if this error came from one
    pub fn status(&self) -> Option<u16> {
        match self {
            SyncError::UpstreamError { status, .. } => Some(*status),
            SyncError::NetworkError(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
