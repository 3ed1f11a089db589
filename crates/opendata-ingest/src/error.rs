//! Error types for ingestion
//!
//! Most failures during a market run are absorbed where they are detected and
//! only logged; these variants carry them up to that point, and carry the few
//! genuinely fatal ones (bad configuration, unwritable output) to the CLI.

use thiserror::Error;

/// Result type for ingestion operations
pub type Result<T> = std::result::Result<T, IngestError>;

/// Error types for ingestion
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Download error: {0}")]
    Download(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid link pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Market definition error: {0}")]
    Definition(#[from] toml::de::Error),

    #[error(transparent)]
    Common(#[from] opendata_common::OpendataError),

    #[error("HTTP status {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl IngestError {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a parse error
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Whether retrying the same request could plausibly succeed
    pub fn is_transient(&self) -> bool {
        match self {
            IngestError::Download(err) => {
                err.is_timeout() || err.is_connect() || err.is_request() || err.is_body()
            },
            IngestError::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}
