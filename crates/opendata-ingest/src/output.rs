//! CSV output and yearly totals

use crate::archive::RawTable;
use crate::error::Result;
use crate::markets::Market;
use opendata_common::types::{station_columns, trip_columns};
use opendata_common::{StationRecord, TripRecord};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::{info, warn};

/// Write trips with the canonical header, even when there are none
pub fn write_trips<W: Write>(writer: W, trips: &[TripRecord]) -> Result<()> {
    write_records(writer, &trip_columns::ALL, trips)
}

pub fn write_stations<W: Write>(writer: W, stations: &[StationRecord]) -> Result<()> {
    write_records(writer, &station_columns::ALL, stations)
}

pub fn write_trips_csv(path: impl AsRef<Path>, trips: &[TripRecord]) -> Result<()> {
    let path = path.as_ref();
    write_trips(File::create(path)?, trips)?;
    info!(path = %path.display(), rows = trips.len(), "Wrote trips");
    Ok(())
}

pub fn write_stations_csv(path: impl AsRef<Path>, stations: &[StationRecord]) -> Result<()> {
    let path = path.as_ref();
    write_stations(File::create(path)?, stations)?;
    info!(path = %path.display(), rows = stations.len(), "Wrote stations");
    Ok(())
}

fn write_records<W: Write, T: Serialize>(writer: W, header: &[&str], records: &[T]) -> Result<()> {
    let mut csv = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);

    csv.write_record(header)?;
    for record in records {
        csv.serialize(record)?;
    }
    csv.flush()?;
    Ok(())
}

/// Write source tables as one CSV. The header is the union of the tables'
/// headers in first-seen order; a table without a column gets blanks there.
pub fn write_raw_tables<W: Write>(writer: W, tables: &[RawTable]) -> Result<()> {
    let mut header: Vec<&str> = Vec::new();
    for name in tables.iter().flat_map(|t| t.headers.iter()) {
        if !header.contains(&name.as_str()) {
            header.push(name);
        }
    }

    let mut csv = csv::WriterBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_writer(writer);

    if !header.is_empty() {
        csv.write_record(&header)?;
    }
    for table in tables {
        let positions: Vec<Option<usize>> =
            header.iter().map(|name| table.column_index(name)).collect();
        for row in &table.rows {
            csv.write_record(
                positions
                    .iter()
                    .map(|position| position.and_then(|i| row.get(i)).unwrap_or("")),
            )?;
        }
    }
    csv.flush()?;
    Ok(())
}

pub fn write_raw_csv(path: impl AsRef<Path>, tables: &[RawTable]) -> Result<()> {
    let path = path.as_ref();
    write_raw_tables(File::create(path)?, tables)?;
    info!(
        path = %path.display(),
        files = tables.len(),
        rows = tables.iter().map(|t| t.rows.len()).sum::<usize>(),
        "Wrote raw tables"
    );
    Ok(())
}

/// Trips of one market in one year
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketTotal {
    pub system: String,
    pub count: usize,
}

/// Count, per market, the rows of `<dir>/<market>.csv` whose `started_at`
/// falls in `year`. Markets without an output file are skipped.
pub fn yearly_totals(dir: impl AsRef<Path>, markets: &[Market], year: i32) -> Result<Vec<MarketTotal>> {
    let dir = dir.as_ref();
    let needle = year.to_string();
    let mut totals = Vec::new();

    for market in markets {
        let path = dir.join(format!("{market}.csv"));
        if !path.exists() {
            warn!(%market, path = %path.display(), "No output file for market, skipping");
            continue;
        }

        let mut reader = csv::Reader::from_path(&path)?;
        let Some(column) = reader
            .headers()?
            .iter()
            .position(|h| h == trip_columns::STARTED_AT)
        else {
            warn!(%market, path = %path.display(), "Output file has no started_at column, skipping");
            continue;
        };

        let mut count = 0;
        for record in reader.records() {
            let record = record?;
            if record.get(column).is_some_and(|value| value.contains(&needle)) {
                count += 1;
            }
        }

        info!(%market, year, count, "Counted trips");
        totals.push(MarketTotal {
            system: market.to_string(),
            count,
        });
    }

    Ok(totals)
}

pub fn write_totals_csv(path: impl AsRef<Path>, totals: &[MarketTotal]) -> Result<()> {
    let mut csv = csv::Writer::from_path(path.as_ref())?;
    for total in totals {
        csv.serialize(total)?;
    }
    csv.flush()?;
    Ok(())
}
