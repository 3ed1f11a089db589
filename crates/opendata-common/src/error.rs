//! Error types shared across the opendata crates

use thiserror::Error;

/// Result type alias for shared operations
pub type Result<T> = std::result::Result<T, OpendataError>;

/// Main error type for shared helpers
#[derive(Error, Debug)]
pub enum OpendataError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unknown market: {0}")]
    UnknownMarket(String),
}
