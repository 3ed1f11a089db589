//! Station enrichment
//!
//! Some operators publish trips that carry only station ids, plus a separate
//! station table with names and coordinates. Those attributes are copied onto
//! each trip's start and end station wherever the trip itself has none.

use opendata_common::{StationRecord, TripRecord};
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// Keep one record per station id: the last one encountered.
///
/// Archives are read oldest first, so later records are the most recent.
pub fn dedup_stations(stations: Vec<StationRecord>) -> Vec<StationRecord> {
    let before = stations.len();
    let mut seen = HashSet::new();

    let mut latest: Vec<StationRecord> = stations
        .into_iter()
        .rev()
        .filter(|station| seen.insert(station.station_id.clone()))
        .collect();
    latest.reverse();

    if latest.len() < before {
        debug!(before, after = latest.len(), "Deduplicated station records");
    }
    latest
}

/// Fill missing station names and coordinates on trips from the station table
pub fn merge_stations(trips: &mut [TripRecord], stations: &[StationRecord]) {
    let by_id: HashMap<&str, &StationRecord> = stations
        .iter()
        .map(|station| (station.station_id.as_str(), station))
        .collect();

    let mut filled = 0usize;
    for trip in trips.iter_mut() {
        if let Some(station) = lookup(&by_id, trip.start_station_id.as_deref()) {
            filled += fill(
                &mut trip.start_station_name,
                &mut trip.start_lat,
                &mut trip.start_lng,
                station,
            );
        }
        if let Some(station) = lookup(&by_id, trip.end_station_id.as_deref()) {
            filled += fill(
                &mut trip.end_station_name,
                &mut trip.end_lat,
                &mut trip.end_lng,
                station,
            );
        }
    }

    debug!(stations = stations.len(), fields_filled = filled, "Merged station table into trips");
}

fn lookup<'a>(
    by_id: &HashMap<&str, &'a StationRecord>,
    id: Option<&str>,
) -> Option<&'a StationRecord> {
    by_id.get(id?.trim()).copied()
}

/// Fill each empty field from the station; returns how many were filled
fn fill(
    name: &mut Option<String>,
    lat: &mut Option<f64>,
    lng: &mut Option<f64>,
    station: &StationRecord,
) -> usize {
    let mut filled = 0;
    if name.is_none() && station.name.is_some() {
        *name = station.name.clone();
        filled += 1;
    }
    if lat.is_none() && station.lat.is_some() {
        *lat = station.lat;
        filled += 1;
    }
    if lng.is_none() && station.lng.is_some() {
        *lng = station.lng;
        filled += 1;
    }
    filled
}

/// Remove trips without a start timestamp; returns the survivors and the
/// number dropped
pub fn drop_malformed_trips(trips: Vec<TripRecord>) -> (Vec<TripRecord>, usize) {
    let before = trips.len();
    let kept: Vec<TripRecord> = trips
        .into_iter()
        .filter(TripRecord::is_well_formed)
        .collect();
    let dropped = before - kept.len();

    if dropped > 0 {
        warn!("Dropping {} rows missing a started_at timestamp", dropped);
    }
    (kept, dropped)
}
