//! Opendata Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared types, utilities, and error handling for the opendata workspace.
//!
//! # Overview
//!
//! This crate provides common functionality used across all workspace members:
//!
//! - **Error Handling**: Custom error types and result types
//! - **Checksums**: SHA-256 digests for cache keys and archive integrity logs
//! - **Logging**: `tracing` subscriber bootstrap
//! - **Types**: The canonical trip and station records every operator is folded into
//!
//! # Example
//!
//! ```no_run
//! use opendata_common::checksum::sha256_hex;
//!
//! let key = sha256_hex("https://s3.amazonaws.com/tripdata/201306-citibike-tripdata.zip");
//! assert_eq!(key.len(), 64);
//! ```

pub mod checksum;
pub mod error;
pub mod logging;
pub mod types;

// Re-export commonly used types
pub use error::{OpendataError, Result};
pub use types::{StationRecord, TripRecord};
