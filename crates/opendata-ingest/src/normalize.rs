//! Column normalization
//!
//! Folds raw tables with operator-specific headers into one table with
//! exactly the canonical columns. For every canonical column the candidate
//! source columns are coalesced in priority order, then the value is coerced
//! to the column's kind. A value that fails coercion becomes null and the row
//! is kept.

use crate::archive::RawTable;
use crate::schema::{ColumnKind, ColumnSpec};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use opendata_common::types::{station_columns, trip_columns};
use opendata_common::{StationRecord, TripRecord};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Raw values treated as missing, compared case-insensitively
const NULL_MARKERS: [&str; 5] = ["na", "n/a", "null", "nan", "#n/a"];

/// Date-time layouts seen across operators, tried in order
const DATETIME_FORMATS: [&str; 8] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S%.f",
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %I:%M %p",
    "%Y/%m/%d %H:%M:%S",
];

/// Layouts with a numeric offset; the wall-clock time is kept
const OFFSET_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%.f %z"];

/// Zone names some exports append to an otherwise plain timestamp
const ZONE_SUFFIXES: [&str; 2] = ["UTC", "GMT"];

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%m/%d/%Y"];

/// A typed cell of a normalized table
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    Float(f64),
    Timestamp(NaiveDateTime),
}

/// Whether a raw CSV value counts as missing
pub fn is_null(raw: &str) -> bool {
    let trimmed = raw.trim();
    trimmed.is_empty()
        || NULL_MARKERS
            .iter()
            .any(|marker| trimmed.eq_ignore_ascii_case(marker))
}

/// Parse a timestamp in any of the layouts operators use
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    let raw = ZONE_SUFFIXES
        .iter()
        .find_map(|zone| raw.strip_suffix(zone))
        .map(str::trim_end)
        .unwrap_or(raw);

    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .or_else(|| {
            DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|dt| dt.naive_local())
        })
        .or_else(|| {
            OFFSET_FORMATS
                .iter()
                .find_map(|format| DateTime::parse_from_str(raw, format).ok())
                .map(|dt| dt.naive_local())
        })
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

/// Coerce a non-null raw value. `Err` means the value is not of the kind.
fn coerce(raw: &str, kind: &ColumnKind) -> std::result::Result<Option<Value>, ()> {
    match kind {
        ColumnKind::Text => Ok(Some(Value::Text(raw.to_string()))),
        ColumnKind::Float => match raw.parse::<f64>() {
            Ok(value) if value.is_finite() => Ok(Some(Value::Float(value))),
            _ => Err(()),
        },
        ColumnKind::Timestamp => parse_timestamp(raw).map(|ts| Some(Value::Timestamp(ts))).ok_or(()),
        ColumnKind::Category { remap } => Ok(remap.apply(raw).map(Value::Text)),
    }
}

/// A table with exactly the canonical columns of a schema
#[derive(Debug, Clone, Default)]
pub struct NormalizedTable {
    columns: Vec<String>,
    index: HashMap<String, usize>,
    rows: Vec<Vec<Option<Value>>>,
}

impl NormalizedTable {
    fn with_columns(specs: &[ColumnSpec]) -> Self {
        let columns: Vec<String> = specs.iter().map(|s| s.canonical_name.clone()).collect();
        let index = columns
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();

        Self {
            columns,
            index,
            rows: Vec::new(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> impl Iterator<Item = RowView<'_>> {
        self.rows.iter().map(move |cells| RowView { table: self, cells })
    }

    /// Read every row into a typed record, skipping rows the type rejects
    pub fn records<T: FromNormalizedRow>(&self) -> Vec<T> {
        self.rows().filter_map(|row| T::from_row(&row)).collect()
    }
}

/// Borrowed view of one normalized row
pub struct RowView<'a> {
    table: &'a NormalizedTable,
    cells: &'a [Option<Value>],
}

impl RowView<'_> {
    pub fn value(&self, column: &str) -> Option<&Value> {
        let i = *self.table.index.get(column)?;
        self.cells.get(i)?.as_ref()
    }

    pub fn text(&self, column: &str) -> Option<String> {
        match self.value(column)? {
            Value::Text(s) => Some(s.clone()),
            Value::Float(f) => Some(f.to_string()),
            Value::Timestamp(ts) => Some(ts.to_string()),
        }
    }

    pub fn float(&self, column: &str) -> Option<f64> {
        match self.value(column)? {
            Value::Float(f) => Some(*f),
            Value::Text(s) => s.trim().parse().ok(),
            Value::Timestamp(_) => None,
        }
    }

    pub fn timestamp(&self, column: &str) -> Option<NaiveDateTime> {
        match self.value(column)? {
            Value::Timestamp(ts) => Some(*ts),
            Value::Text(s) => parse_timestamp(s),
            Value::Float(_) => None,
        }
    }
}

/// Typed canonical records built from normalized rows
pub trait FromNormalizedRow: Sized {
    fn from_row(row: &RowView<'_>) -> Option<Self>;
}

impl FromNormalizedRow for TripRecord {
    fn from_row(row: &RowView<'_>) -> Option<Self> {
        use trip_columns::*;

        Some(TripRecord {
            ride_id: row.text(RIDE_ID),
            started_at: row.timestamp(STARTED_AT),
            ended_at: row.timestamp(ENDED_AT),
            start_station_id: row.text(START_STATION_ID),
            end_station_id: row.text(END_STATION_ID),
            start_station_name: row.text(START_STATION_NAME),
            end_station_name: row.text(END_STATION_NAME),
            start_lat: row.float(START_LAT),
            start_lng: row.float(START_LNG),
            end_lat: row.float(END_LAT),
            end_lng: row.float(END_LNG),
            rideable_type: row.text(RIDEABLE_TYPE),
            user_type: row.text(USER_TYPE),
            gender: row.text(GENDER),
            bike_id: row.text(BIKE_ID),
            birth_year: row.text(BIRTH_YEAR),
        })
    }
}

/// Stations without an id cannot be joined and are skipped
impl FromNormalizedRow for StationRecord {
    fn from_row(row: &RowView<'_>) -> Option<Self> {
        use station_columns::*;

        Some(StationRecord {
            station_id: row.text(STATION_ID)?,
            name: row.text(NAME),
            lat: row.float(LAT),
            lng: row.float(LNG),
            created_at: row.timestamp(CREATED_AT),
            is_active: row.text(IS_ACTIVE),
        })
    }
}

/// Fold raw tables into the canonical columns of `specs`
pub fn normalize(tables: &[RawTable], specs: &[ColumnSpec]) -> NormalizedTable {
    let mut normalized = NormalizedTable::with_columns(specs);
    let mut failures = vec![0usize; specs.len()];

    for table in tables {
        // Candidate positions in this table, in priority order
        let candidates: Vec<Vec<usize>> = specs
            .iter()
            .map(|spec| {
                spec.candidate_source_names
                    .iter()
                    .filter_map(|name| table.column_index(name))
                    .collect()
            })
            .collect();

        for record in &table.rows {
            let mut cells = Vec::with_capacity(specs.len());

            for (i, (spec, positions)) in specs.iter().zip(&candidates).enumerate() {
                let raw = positions
                    .iter()
                    .filter_map(|&position| record.get(position))
                    .find(|value| !is_null(value));

                let cell = match raw {
                    Some(raw) => coerce(raw.trim(), &spec.kind).unwrap_or_else(|()| {
                        failures[i] += 1;
                        None
                    }),
                    None => None,
                };
                cells.push(cell);
            }

            normalized.rows.push(cells);
        }

        debug!(source = %table.source, rows = table.rows.len(), "Normalized table");
    }

    for (spec, count) in specs.iter().zip(failures) {
        if count > 0 {
            warn!(
                column = %spec.canonical_name,
                failures = count,
                "Values could not be coerced and were set to null"
            );
        }
    }

    normalized
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::archive::TableKind;
    use crate::schema::{StationColumnSources, TripColumnSources};
    use csv::StringRecord;

    fn table(headers: &[&str], rows: &[&[&str]]) -> RawTable {
        RawTable {
            kind: TableKind::Trips,
            source: "test".to_string(),
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: rows.iter().map(|r| StringRecord::from(r.to_vec())).collect(),
        }
    }

    fn ts(raw: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    #[test]
    fn test_is_null() {
        for raw in ["", "  ", "NA", "n/a", "NULL", "NaN", "#N/A"] {
            assert!(is_null(raw), "{raw:?} should be null");
        }
        assert!(!is_null("0"));
        assert!(!is_null("Nathan"));
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = ts("2019-07-01 08:05:00");
        for raw in [
            "2019-07-01 08:05:00",
            "2019-07-01 08:05:00.0000",
            "2019-07-01T08:05:00",
            "2019-07-01 08:05",
            "7/1/2019 08:05:00",
            "07/01/2019 8:05",
            "2019/07/01 08:05:00",
            "2019-07-01T08:05:00Z",
        ] {
            assert_eq!(parse_timestamp(raw), Some(expected), "{raw}");
        }

        assert_eq!(parse_timestamp("7/7/2016"), Some(ts("2016-07-07 00:00:00")));
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn test_parse_timestamp_twelve_hour_and_zoned() {
        assert_eq!(parse_timestamp("6/14/2013 12:11 PM"), Some(ts("2013-06-14 12:11:00")));
        assert_eq!(parse_timestamp("6/14/2013 12:11:30 AM"), Some(ts("2013-06-14 00:11:30")));
        assert_eq!(parse_timestamp("7/1/2019 8:05 pm"), Some(ts("2019-07-01 20:05:00")));

        let expected = ts("2019-01-01 00:04:37");
        for raw in [
            "2019-01-01 00:04:37 UTC",
            "2019-01-01 00:04:37.000 UTC",
            "2019-01-01 00:04:37+00:00",
            "2019-01-01 00:04:37 +0000",
        ] {
            assert_eq!(parse_timestamp(raw), Some(expected), "{raw}");
        }
        assert_eq!(parse_timestamp("UTC"), None);
    }

    #[test]
    fn test_coalesce_across_renamed_columns() {
        let specs = TripColumnSources {
            started_at: &["start_time", "started_at"],
            ..Default::default()
        }
        .into_specs();

        let old = table(&["start_time"], &[&["2019-01-01 00:00:00"]]);
        let new = table(&["started_at", "rideable_type"], &[&["2021-06-01 12:00:00", "docked_bike"]]);

        let normalized = normalize(&[old, new], &specs);
        assert_eq!(normalized.len(), 2);
        assert_eq!(normalized.columns(), trip_columns::ALL.map(String::from).as_slice());

        let trips: Vec<TripRecord> = normalized.records();
        assert_eq!(trips[0].started_at, Some(ts("2019-01-01 00:00:00")));
        assert_eq!(trips[1].started_at, Some(ts("2021-06-01 12:00:00")));
        // Source column not in the schema
        assert_eq!(trips[1].rideable_type, None);
    }

    #[test]
    fn test_first_non_null_candidate_wins() {
        let specs = TripColumnSources {
            start_lat: &["start_lat", "start station latitude"],
            ..Default::default()
        }
        .into_specs();

        let raw = table(
            &["start station latitude", "start_lat"],
            &[&["41.1", ""], &["41.2", "42.0"], &["", "NA"]],
        );

        let trips: Vec<TripRecord> = normalize(&[raw], &specs).records();
        assert_eq!(trips[0].start_lat, Some(41.1));
        assert_eq!(trips[1].start_lat, Some(42.0));
        assert_eq!(trips[2].start_lat, None);
    }

    #[test]
    fn test_coercion_failure_nulls_cell_keeps_row() {
        let specs = TripColumnSources {
            started_at: &["starttime"],
            start_lat: &["lat"],
            ..Default::default()
        }
        .into_specs();

        let raw = table(&["starttime", "lat"], &[&["not a date", "40.7"], &["2020-01-01 00:00:00", "north"]]);

        let trips: Vec<TripRecord> = normalize(&[raw], &specs).records();
        assert_eq!(trips.len(), 2);
        assert_eq!(trips[0].started_at, None);
        assert_eq!(trips[0].start_lat, Some(40.7));
        assert!(trips[1].started_at.is_some());
        assert_eq!(trips[1].start_lat, None);
    }

    #[test]
    fn test_category_remap() {
        let specs = TripColumnSources {
            user_type: &["usertype"],
            gender: &["gender"],
            ..Default::default()
        }
        .into_specs();

        let raw = table(
            &["usertype", "gender"],
            &[&["Subscriber", "1"], &["Customer", "0"], &["Dependent", "2"]],
        );

        let trips: Vec<TripRecord> = normalize(&[raw], &specs).records();
        assert_eq!(trips[0].user_type.as_deref(), Some("member"));
        assert_eq!(trips[0].gender.as_deref(), Some("male"));
        assert_eq!(trips[1].user_type.as_deref(), Some("casual"));
        assert_eq!(trips[1].gender, None);
        assert_eq!(trips[2].user_type.as_deref(), Some("Dependent"));
        assert_eq!(trips[2].gender.as_deref(), Some("female"));
    }

    #[test]
    fn test_ragged_rows_are_null() {
        let specs = TripColumnSources {
            started_at: &["started_at"],
            bike_id: &["bikeid"],
            ..Default::default()
        }
        .into_specs();

        let raw = table(&["started_at", "bikeid"], &[&["2020-01-01 00:00:00"]]);
        let trips: Vec<TripRecord> = normalize(&[raw], &specs).records();
        assert_eq!(trips[0].bike_id, None);
    }

    #[test]
    fn test_stations_without_id_are_skipped() {
        let specs = StationColumnSources {
            station_id: &["Station_ID"],
            name: &["Station_Name"],
            created_at: &["Day of Go_live_date"],
            ..Default::default()
        }
        .into_specs();

        let raw = table(
            &["Station_ID", "Station_Name", "Day of Go_live_date"],
            &[&["3004", "Municipal Services Building", "4/23/2015"], &["", "Ghost", ""]],
        );

        let stations: Vec<StationRecord> = normalize(&[raw], &specs).records();
        assert_eq!(stations.len(), 1);
        assert_eq!(stations[0].station_id, "3004");
        assert_eq!(stations[0].created_at, Some(ts("2015-04-23 00:00:00")));
    }
}
