//! Market ingestion pipeline
//!
//! Runs one market end to end:
//!
//! 1. Discover archive links on the market's index page
//! 2. Acquire every archive through the content cache (concurrent)
//! 3. Read, classify, and sample archive members (blocking thread)
//! 4. Normalize trips and stations onto the canonical schemas
//! 5. Enrich trips from the station table
//! 6. Drop trips without a start timestamp
//!
//! [`MarketPipeline::run_raw`] stops after step 3 and returns the source
//! tables as read.
//!
//! Failures of individual links, archives, members, or cells are logged and
//! skipped; a run only fails on setup errors.

use crate::archive::{ArchiveIngester, IngestedTables};
use crate::cache::{CacheStatus, ContentCache};
use crate::config::IngestConfig;
use crate::discovery::discoverer_for;
use crate::error::Result;
use crate::markets::MarketConfig;
use crate::normalize::normalize;
use crate::stations::{dedup_stations, drop_malformed_trips, merge_stations};
use opendata_common::{StationRecord, TripRecord};
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};
use tracing::{info, instrument};

/// Counters describing one market run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineStats {
    pub links_found: usize,
    pub archives_cached: usize,
    pub archives_downloaded: usize,
    pub archives_unavailable: usize,
    pub trip_files: usize,
    pub station_files: usize,
    pub trip_rows: usize,
    pub station_rows: usize,
    pub trips_dropped: usize,
    pub elapsed: Duration,
}

/// Canonical tables produced by a run
#[derive(Debug)]
pub struct PipelineOutput {
    pub trips: Vec<TripRecord>,
    pub stations: Vec<StationRecord>,
    pub stats: PipelineStats,
}

/// Source tables produced by a raw run, before normalization
#[derive(Debug)]
pub struct RawPipelineOutput {
    pub tables: IngestedTables,
    pub stats: PipelineStats,
}

pub struct MarketPipeline {
    config: IngestConfig,
    market: MarketConfig,
}

impl MarketPipeline {
    pub fn new(config: IngestConfig, market: MarketConfig) -> Self {
        Self { config, market }
    }

    #[instrument(skip(self), fields(market = %self.market.name))]
    pub async fn run(&self, sample_rate: NonZeroUsize) -> Result<PipelineOutput> {
        let start = Instant::now();
        let mut stats = PipelineStats::default();
        let tables = self.ingest_tables(sample_rate, &mut stats).await?;

        let mut trips: Vec<TripRecord> =
            normalize(&tables.trips, &self.market.trip_columns).records();

        let stations = match self.market.station_columns {
            Some(ref station_columns) => {
                let stations = dedup_stations(normalize(&tables.stations, station_columns).records());
                merge_stations(&mut trips, &stations);
                stations
            },
            None => Vec::new(),
        };
        drop(tables);

        let (trips, dropped) = drop_malformed_trips(trips);
        stats.trips_dropped = dropped;
        stats.trip_rows = trips.len();
        stats.station_rows = stations.len();
        stats.elapsed = start.elapsed();

        info!(
            links = stats.links_found,
            cached = stats.archives_cached,
            downloaded = stats.archives_downloaded,
            unavailable = stats.archives_unavailable,
            trip_files = stats.trip_files,
            station_files = stats.station_files,
            trips = stats.trip_rows,
            stations = stats.station_rows,
            dropped = stats.trips_dropped,
            elapsed_secs = stats.elapsed.as_secs_f64(),
            "Market ingestion complete"
        );

        Ok(PipelineOutput {
            trips,
            stations,
            stats,
        })
    }

    /// Discover, cache, and read archives without normalizing them
    #[instrument(skip(self), fields(market = %self.market.name))]
    pub async fn run_raw(&self, sample_rate: NonZeroUsize) -> Result<RawPipelineOutput> {
        let start = Instant::now();
        let mut stats = PipelineStats::default();
        let tables = self.ingest_tables(sample_rate, &mut stats).await?;

        stats.trip_rows = tables.trip_row_count();
        stats.station_rows = tables.station_row_count();
        stats.elapsed = start.elapsed();

        info!(
            links = stats.links_found,
            trip_files = stats.trip_files,
            station_files = stats.station_files,
            trips = stats.trip_rows,
            stations = stats.station_rows,
            elapsed_secs = stats.elapsed.as_secs_f64(),
            "Raw market ingestion complete"
        );

        Ok(RawPipelineOutput { tables, stats })
    }

    async fn ingest_tables(
        &self,
        sample_rate: NonZeroUsize,
        stats: &mut PipelineStats,
    ) -> Result<IngestedTables> {
        self.config.validate()?;
        self.market.validate()?;
        let pattern = self.market.link_regex()?;
        let client = self.config.http_client()?;

        info!(url = %self.market.data_url, "Discovering archives");
        let discoverer = discoverer_for(self.market.index_kind, client.clone(), &self.config);
        let links = discoverer
            .discover_links(&self.market.data_url, &pattern, self.config.discovery_timeout())
            .await;
        stats.links_found = links.len();

        let cache = ContentCache::new(
            self.config.market_dir(&self.market.name),
            client,
            &self.config,
        );
        let records = cache.acquire_all(&links).await;
        for record in &records {
            match record.status {
                CacheStatus::Cached => stats.archives_cached += 1,
                CacheStatus::Downloaded => stats.archives_downloaded += 1,
                CacheStatus::Unavailable { .. } => stats.archives_unavailable += 1,
            }
        }

        let ingester = ArchiveIngester::for_market(&self.market, sample_rate);
        let tables = tokio::task::spawn_blocking(move || ingester.ingest(&records)).await?;
        stats.trip_files = tables.trips.len();
        stats.station_files = tables.stations.len();

        Ok(tables)
    }
}
