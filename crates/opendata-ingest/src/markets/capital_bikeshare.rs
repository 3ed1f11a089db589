use super::{column_set, MarketConfig, DEFAULT_LINK_PATTERN};
use crate::discovery::IndexKind;
use crate::schema::TripColumnSources;

pub(super) fn config() -> MarketConfig {
    MarketConfig {
        name: "capital_bikeshare".to_string(),
        data_url: "https://s3.amazonaws.com/capitalbikeshare-data/index.html".to_string(),
        info_url: "https://www.capitalbikeshare.com/system-data".to_string(),
        license_url: "https://www.capitalbikeshare.com/data-license-agreement".to_string(),
        license_name: "Capital Bikeshare Data License Agreement".to_string(),
        index_kind: IndexKind::S3Listing,
        link_pattern: DEFAULT_LINK_PATTERN.to_string(),
        trip_columns: TripColumnSources {
            ride_id: &["ride_id"],
            started_at: &["started_at", "Start date"],
            ended_at: &["ended_at", "End date"],
            start_station_id: &["Start station number", "start_station_id"],
            end_station_id: &["End station number", "end_station_id"],
            start_station_name: &["Start station", "start_station_name"],
            end_station_name: &["End station", "end_station_name"],
            start_lat: &["start_lat"],
            start_lng: &["start_lng"],
            end_lat: &["end_lat"],
            end_lng: &["end_lng"],
            rideable_type: &["rideable_type"],
            user_type: &["member_casual", "Member type"],
            bike_id: &["Bike number"],
            ..Default::default()
        }
        .into_specs(),
        station_columns: None,
        ignore_columns: column_set(&["Duration"]),
    }
}
