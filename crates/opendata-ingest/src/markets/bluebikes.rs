use super::{column_set, MarketConfig, DEFAULT_LINK_PATTERN};
use crate::discovery::IndexKind;
use crate::schema::TripColumnSources;

pub(super) fn config() -> MarketConfig {
    MarketConfig {
        name: "bluebikes".to_string(),
        data_url: "https://s3.amazonaws.com/hubway-data/index.html".to_string(),
        info_url: "https://www.bluebikes.com/system-data".to_string(),
        license_url: "https://www.bluebikes.com/data-license-agreement".to_string(),
        license_name: "Bluebikes Data License Agreement".to_string(),
        index_kind: IndexKind::S3Listing,
        link_pattern: DEFAULT_LINK_PATTERN.to_string(),
        trip_columns: TripColumnSources {
            ride_id: &["ride_id"],
            started_at: &["started_at", "starttime"],
            ended_at: &["ended_at", "stoptime"],
            start_station_id: &["start_station_id", "start station id"],
            end_station_id: &["end_station_id", "end station id"],
            start_station_name: &["start station name", "start_station_name"],
            end_station_name: &["end station name", "end_station_name"],
            start_lat: &["start_lat", "start station latitude"],
            start_lng: &["start_lng", "start station longitude"],
            end_lat: &["end_lat", "end station latitude"],
            end_lng: &["end_lng", "end station longitude"],
            rideable_type: &["rideable_type"],
            user_type: &["member_casual", "usertype"],
            gender: &["gender"],
            bike_id: &["bikeid"],
            birth_year: &["birth year"],
        }
        .into_specs(),
        station_columns: None,
        ignore_columns: column_set(&["tripduration", "postal code"]),
    }
}
