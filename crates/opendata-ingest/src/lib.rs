//! Opendata Ingest Library
//!
//! Ingests the published trip histories of bikeshare operators and folds
//! their heterogeneous CSV exports into one canonical trip table (and, where
//! published, a station table).
//!
//! # Stages
//!
//! - [`discovery`]: find archive links on an operator's index page
//! - [`cache`]: content-addressed, concurrent archive downloads
//! - [`archive`]: classify and sample the CSV members of each archive
//! - [`normalize`]: coalesce, coerce, and remap columns onto the canonical schema
//! - [`stations`]: enrich trips from the station table
//!
//! [`pipeline::MarketPipeline`] wires the stages together for one [`markets::Market`].
//!
//! # Example
//!
//! ```no_run
//! use opendata_ingest::{config::IngestConfig, markets::Market, pipeline::MarketPipeline};
//! use std::num::NonZeroUsize;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let pipeline = MarketPipeline::new(IngestConfig::from_env()?, Market::Divvy.config());
//!     let output = pipeline.run(NonZeroUsize::new(1000).unwrap()).await?;
//!     opendata_ingest::output::write_trips_csv("divvy.csv", &output.trips)?;
//!     Ok(())
//! }
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod archive;
pub mod cache;
pub mod config;
pub mod discovery;
pub mod error;
pub mod markets;
pub mod normalize;
pub mod output;
pub mod pipeline;
pub mod schema;
pub mod stations;

pub use error::{IngestError, Result};
