//! Archive ingestion
//!
//! Reads every CSV member of the cached zip archives, decides whether each
//! one holds trips or stations, and samples trip rows while streaming so a
//! multi-gigabyte export is never held in memory in full.

use crate::cache::ArchiveRecord;
use crate::error::Result;
use crate::markets::MarketConfig;
use crate::schema::{source_columns, ColumnSpec};
use csv::{ByteRecord, ReaderBuilder, StringRecord};
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufReader, Read};
use std::num::NonZeroUsize;
use tracing::{debug, info, warn};

const UTF8_BOM: char = '\u{feff}';

/// What a CSV member contains
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    Trips,
    Stations,
}

/// One CSV member, as read: source header names and (sampled) rows
#[derive(Debug, Clone)]
pub struct RawTable {
    pub kind: TableKind,
    /// `<archive url>!<member name>`
    pub source: String,
    pub headers: Vec<String>,
    pub rows: Vec<StringRecord>,
}

impl RawTable {
    /// Position of a source column, by exact name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|header| header == name)
    }
}

/// All trip and station tables of a market, in archive then member order
#[derive(Debug, Default)]
pub struct IngestedTables {
    pub trips: Vec<RawTable>,
    pub stations: Vec<RawTable>,
}

impl IngestedTables {
    pub fn trip_row_count(&self) -> usize {
        self.trips.iter().map(|t| t.rows.len()).sum()
    }

    pub fn station_row_count(&self) -> usize {
        self.stations.iter().map(|t| t.rows.len()).sum()
    }
}

/// Classify a CSV member from its header row.
///
/// Without station sources everything is trips. Otherwise the share of
/// expected trip columns present is compared with the share of expected
/// station columns present; only a strictly larger trip share means trips.
pub fn classify(
    headers: &[String],
    trip_sources: &BTreeSet<String>,
    station_sources: &BTreeSet<String>,
) -> TableKind {
    if station_sources.is_empty() || headers.is_empty() {
        return TableKind::Trips;
    }

    let found: BTreeSet<&str> = headers.iter().map(String::as_str).collect();
    let ratio = |expected: &BTreeSet<String>| {
        if expected.is_empty() {
            return 0.0;
        }
        let hits = expected.iter().filter(|c| found.contains(c.as_str())).count();
        hits as f64 / expected.len() as f64
    };

    let trip_ratio = ratio(trip_sources);
    let station_ratio = ratio(station_sources);

    if trip_ratio > station_ratio {
        TableKind::Trips
    } else {
        if trip_ratio == station_ratio {
            debug!(trip_ratio, ?headers, "Header matches trips and stations equally; using stations");
        }
        TableKind::Stations
    }
}

/// Reads cached archives into raw tables for one market
pub struct ArchiveIngester {
    trip_columns: Vec<ColumnSpec>,
    station_columns: Option<Vec<ColumnSpec>>,
    trip_sources: BTreeSet<String>,
    station_sources: BTreeSet<String>,
    ignore_columns: BTreeSet<String>,
    sample_rate: NonZeroUsize,
}

impl ArchiveIngester {
    pub fn new(
        trip_columns: Vec<ColumnSpec>,
        station_columns: Option<Vec<ColumnSpec>>,
        ignore_columns: BTreeSet<String>,
        sample_rate: NonZeroUsize,
    ) -> Self {
        let owned = |specs: &[ColumnSpec]| -> BTreeSet<String> {
            source_columns(specs).into_iter().map(str::to_string).collect()
        };

        Self {
            trip_sources: owned(trip_columns.as_slice()),
            station_sources: station_columns.as_deref().map(owned).unwrap_or_default(),
            trip_columns,
            station_columns,
            ignore_columns,
            sample_rate,
        }
    }

    pub fn for_market(config: &MarketConfig, sample_rate: NonZeroUsize) -> Self {
        Self::new(
            config.trip_columns.clone(),
            config.station_columns.clone(),
            config.ignore_columns.clone(),
            sample_rate,
        )
    }

    /// Read every available archive. Blocking; run it off the async runtime.
    pub fn ingest(&self, records: &[ArchiveRecord]) -> IngestedTables {
        let mut tables = IngestedTables::default();

        for record in records {
            if !record.is_available() {
                debug!(url = %record.remote_url, "Skipping unavailable archive");
                continue;
            }

            if let Err(e) = self.ingest_archive(record, &mut tables) {
                warn!(
                    path = %record.local_path.display(),
                    url = %record.remote_url,
                    error = %e,
                    "Failed to open cached archive"
                );
            }
        }

        info!(
            trip_files = tables.trips.len(),
            trip_rows = tables.trip_row_count(),
            station_files = tables.stations.len(),
            station_rows = tables.station_row_count(),
            "Archives ingested"
        );

        audit_columns("Trips", &tables.trips, &self.trip_columns, &self.ignore_columns);
        if let Some(ref station_columns) = self.station_columns {
            audit_columns("Stations", &tables.stations, station_columns, &self.ignore_columns);
        }

        tables
    }

    fn ingest_archive(&self, record: &ArchiveRecord, tables: &mut IngestedTables) -> Result<()> {
        let file = File::open(&record.local_path)?;
        let mut archive = zip::ZipArchive::new(BufReader::new(file))?;

        for i in 0..archive.len() {
            let entry = match archive.by_index(i) {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(url = %record.remote_url, index = i, error = %e, "Unreadable archive entry");
                    continue;
                },
            };

            let name = entry.name().to_string();
            // Resource forks; they look like CSVs but are not
            if name.starts_with("__MACOSX") || entry.is_dir() {
                continue;
            }

            if !name.to_lowercase().ends_with("csv") {
                warn!(url = %record.remote_url, file = %name, "Unexpected file");
                continue;
            }

            let source = format!("{}!{}", record.remote_url, name);
            match self.read_table(entry, source) {
                Ok(table) => {
                    debug!(
                        source = %table.source,
                        kind = ?table.kind,
                        rows = table.rows.len(),
                        "Read CSV member"
                    );
                    match table.kind {
                        TableKind::Trips => tables.trips.push(table),
                        TableKind::Stations => tables.stations.push(table),
                    }
                },
                Err(e) => {
                    warn!(url = %record.remote_url, file = %name, error = %e, "Failed to read CSV member");
                },
            }
        }

        Ok(())
    }

    /// Read one CSV stream: header, classification, then rows
    pub fn read_table<R: Read>(&self, reader: R, source: String) -> Result<RawTable> {
        let mut csv = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers: Vec<String> = csv
            .byte_headers()?
            .iter()
            .enumerate()
            .map(|(i, raw)| {
                let header = String::from_utf8_lossy(raw);
                if i == 0 {
                    header.trim_start_matches(UTF8_BOM).to_string()
                } else {
                    header.into_owned()
                }
            })
            .collect();

        let kind = classify(&headers, &self.trip_sources, &self.station_sources);
        let rate = match kind {
            TableKind::Trips => self.sample_rate.get(),
            TableKind::Stations => 1,
        };

        let mut rows = Vec::new();
        let mut record = ByteRecord::new();
        let mut index = 0usize;
        while csv.read_byte_record(&mut record)? {
            if index % rate == 0 {
                rows.push(StringRecord::from_byte_record_lossy(record.clone()));
            }
            index += 1;
        }

        Ok(RawTable {
            kind,
            source,
            headers,
            rows,
        })
    }
}

/// Result of comparing the columns seen in a market's files with its schema
#[derive(Debug, Default, PartialEq)]
pub struct ColumnAudit {
    pub parsed: BTreeSet<String>,
    pub missing: BTreeSet<String>,
    pub unexpected: BTreeSet<String>,
    /// Canonical columns that no source column populated
    pub uncovered: Vec<String>,
}

/// Log which expected source columns were found, missing, or unexpected
pub fn audit_columns(
    label: &str,
    tables: &[RawTable],
    specs: &[ColumnSpec],
    ignore_columns: &BTreeSet<String>,
) -> ColumnAudit {
    let found: BTreeSet<String> = tables
        .iter()
        .flat_map(|t| t.headers.iter())
        .filter(|h| !ignore_columns.contains(*h))
        .cloned()
        .collect();
    let expected: BTreeSet<String> = source_columns(specs)
        .into_iter()
        .map(str::to_string)
        .collect();

    let audit = ColumnAudit {
        parsed: found.intersection(&expected).cloned().collect(),
        missing: expected.difference(&found).cloned().collect(),
        unexpected: found.difference(&expected).cloned().collect(),
        uncovered: specs
            .iter()
            .filter(|spec| {
                !spec
                    .candidate_source_names
                    .iter()
                    .any(|name| found.contains(name))
            })
            .map(|spec| spec.canonical_name.clone())
            .collect(),
    };

    if !audit.parsed.is_empty() {
        info!("{} columns parsed: {:?}", label, audit.parsed);
    }
    if !audit.missing.is_empty() {
        warn!("{} columns missing: {:?}", label, audit.missing);
    }
    if !audit.unexpected.is_empty() {
        warn!("{} columns unexpected: {:?}", label, audit.unexpected);
    }
    if !audit.uncovered.is_empty() {
        warn!("{} canonical columns with no source: {:?}", label, audit.uncovered);
    }

    audit
}
