use super::{column_set, MarketConfig, DEFAULT_LINK_PATTERN};
use crate::discovery::IndexKind;
use crate::schema::TripColumnSources;

/// Citi Bike changed header capitalisation twice before moving to the shared
/// Lyft layout in 2021.
pub(super) fn config() -> MarketConfig {
    MarketConfig {
        name: "citi_bike".to_string(),
        data_url: "https://s3.amazonaws.com/tripdata/index.html".to_string(),
        info_url: "https://ride.citibikenyc.com/system-data".to_string(),
        license_url: "https://ride.citibikenyc.com/data-sharing-policy".to_string(),
        license_name: "NYCBS Data Use Policy".to_string(),
        index_kind: IndexKind::S3Listing,
        link_pattern: DEFAULT_LINK_PATTERN.to_string(),
        trip_columns: TripColumnSources {
            ride_id: &["ride_id"],
            started_at: &["starttime", "Start Time", "started_at"],
            ended_at: &["stoptime", "Stop Time", "ended_at"],
            start_station_id: &["start station id", "Start Station ID", "start_station_id"],
            end_station_id: &["end station id", "End Station ID", "end_station_id"],
            start_station_name: &[
                "start station name",
                "Start Station Name",
                "start_station_name",
            ],
            end_station_name: &["end station name", "End Station Name", "end_station_name"],
            start_lat: &["start_lat", "start station latitude", "Start Station Latitude"],
            start_lng: &["start_lng", "start station longitude", "Start Station Longitude"],
            end_lat: &["end_lat", "end station latitude", "End Station Latitude"],
            end_lng: &["end_lng", "end station longitude", "End Station Longitude"],
            rideable_type: &["rideable_type"],
            user_type: &["User Type", "usertype", "member_casual"],
            gender: &["Gender", "gender"],
            bike_id: &["bikeid", "Bike ID"],
            birth_year: &["birth year", "Birth Year"],
        }
        .into_specs(),
        station_columns: None,
        ignore_columns: column_set(&["tripduration", "Trip Duration"]),
    }
}
