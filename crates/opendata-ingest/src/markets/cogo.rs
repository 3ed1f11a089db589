use super::{column_set, MarketConfig, DEFAULT_LINK_PATTERN};
use crate::discovery::IndexKind;
use crate::schema::TripColumnSources;

pub(super) fn config() -> MarketConfig {
    MarketConfig {
        name: "cogo".to_string(),
        data_url: "https://s3.amazonaws.com/cogo-sys-data/index.html".to_string(),
        info_url: "https://www.cogobikeshare.com/system-data".to_string(),
        license_url: "https://www.cogobikeshare.com/data-license-agreement".to_string(),
        license_name: "CoGo Data License Agreement".to_string(),
        index_kind: IndexKind::S3Listing,
        link_pattern: DEFAULT_LINK_PATTERN.to_string(),
        trip_columns: TripColumnSources {
            ride_id: &["ride_id", "trip_id"],
            started_at: &["Start Time and Date", "started_at", "start_time"],
            ended_at: &["Stop Time and Date", "ended_at", "end_time"],
            start_station_id: &["Start Station ID", "from_station_id", "start_station_id"],
            end_station_id: &["Stop Station ID", "to_station_id", "end_station_id"],
            start_station_name: &[
                "Start Station Name",
                "from_station_name",
                "start_station_name",
            ],
            end_station_name: &["Stop Station Name", "to_station_name", "end_station_name"],
            // from_station_location / to_station_location hold "POINT (lng lat)"
            // strings and are ignored for now.
            start_lat: &["start_lat", "Start Station Lat"],
            start_lng: &["start_lng", "Start Station Long"],
            end_lat: &["end_lat", "Stop Station Lat"],
            end_lng: &["end_lng", "Stop Station Long"],
            rideable_type: &["rideable_type"],
            user_type: &["member_casual", "usertype", "User Type"],
            gender: &["Gender", "gender"],
            bike_id: &["bikeid", "Bike ID"],
            birth_year: &["Year of Birth", "birthyear"],
        }
        .into_specs(),
        station_columns: None,
        ignore_columns: column_set(&[
            "to_station_location",
            "tripduration",
            "from_station_location",
            "is_equity",
        ]),
    }
}
