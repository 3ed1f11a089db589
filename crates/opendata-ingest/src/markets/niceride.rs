use super::{column_set, MarketConfig, DEFAULT_LINK_PATTERN};
use crate::discovery::IndexKind;
use crate::schema::TripColumnSources;

/// Older Nice Ride archives bundle station snapshots and contain blank rows;
/// both are ignored or dropped downstream.
pub(super) fn config() -> MarketConfig {
    MarketConfig {
        name: "niceride".to_string(),
        data_url: "https://s3.amazonaws.com/niceride-data/index.html".to_string(),
        info_url: "https://www.niceridemn.com/system-data".to_string(),
        license_url: "https://assets.niceridemn.com/data-license-agreement.html".to_string(),
        license_name: "Nice Ride Minnesota Data License Agreement".to_string(),
        index_kind: IndexKind::S3Listing,
        link_pattern: DEFAULT_LINK_PATTERN.to_string(),
        trip_columns: TripColumnSources {
            ride_id: &["ride_id"],
            started_at: &["started_at", "Start date", "start_time"],
            ended_at: &["ended_at", "End date", "end_time"],
            start_station_id: &["Start station number", "start_station_id", "start station id"],
            end_station_id: &["End station number", "end_station_id", "end station id"],
            start_station_name: &["Start station", "start_station_name", "start station name"],
            end_station_name: &["End station", "end_station_name", "end station name"],
            start_lat: &["start_lat", "start station latitude", "Lat", "Latitude"],
            start_lng: &["start_lng", "start station longitude", "Long", "Longitude"],
            end_lat: &["end_lat", "end station latitude"],
            end_lng: &["end_lng", "end station longitude"],
            rideable_type: &["rideable_type"],
            user_type: &["usertype", "Account type", "member_casual"],
            gender: &["gender"],
            bike_id: &["bikeid"],
            birth_year: &["birth year"],
        }
        .into_specs(),
        station_columns: None,
        ignore_columns: column_set(&[
            "Total duration (Seconds)",
            "Number",
            "Start terminal",
            "Total duration (seconds)",
            "Total duration (ms)",
            "NbDocks",
            "Terminal",
            "Station",
            "Nb Docks",
            "bike type",
            "Notes",
            "Nb docks",
            "Total docks",
            "Install date",
            "Name",
            "End terminal",
            "Unnamed: 5",
            "tripduration",
        ]),
    }
}
