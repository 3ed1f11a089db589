use super::{column_set, MarketConfig, DEFAULT_LINK_PATTERN};
use crate::discovery::IndexKind;
use crate::schema::TripColumnSources;

pub(super) fn config() -> MarketConfig {
    MarketConfig {
        name: "bay_wheels".to_string(),
        data_url: "https://s3.amazonaws.com/baywheels-data/index.html".to_string(),
        info_url: "https://www.lyft.com/bikes/bay-wheels/system-data".to_string(),
        license_url: "https://baywheels-assets.s3.amazonaws.com/data-license-agreement.html"
            .to_string(),
        license_name: "Bay Wheels License Agreement".to_string(),
        index_kind: IndexKind::S3Listing,
        link_pattern: DEFAULT_LINK_PATTERN.to_string(),
        trip_columns: TripColumnSources {
            ride_id: &["ride_id"],
            started_at: &["start_time", "started_at"],
            ended_at: &["end_time", "ended_at"],
            start_station_id: &["start_station_id"],
            end_station_id: &["end_station_id"],
            start_station_name: &["start_station_name"],
            end_station_name: &["end_station_name"],
            start_lat: &["start_station_latitude", "start_lat"],
            start_lng: &["start_station_longitude", "start_lng"],
            end_lat: &["end_station_latitude", "end_lat"],
            end_lng: &["end_station_longitude", "end_lng"],
            rideable_type: &["rideable_type"],
            user_type: &["member_casual", "user_type"],
            bike_id: &["bike_id"],
            ..Default::default()
        }
        .into_specs(),
        station_columns: None,
        ignore_columns: column_set(&[
            "rental_access_method",
            "duration_sec",
            "bike_share_for_all_trip",
        ]),
    }
}
