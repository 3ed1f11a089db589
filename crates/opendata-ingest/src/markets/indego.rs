use super::{column_set, MarketConfig, DEFAULT_LINK_PATTERN};
use crate::discovery::IndexKind;
use crate::schema::{StationColumnSources, TripColumnSources};

pub(super) fn config() -> MarketConfig {
    MarketConfig {
        name: "indego".to_string(),
        data_url: "https://www.rideindego.com/about/data/".to_string(),
        info_url: "https://www.rideindego.com/about/data/".to_string(),
        license_url: "https://www.rideindego.com/terms-and-conditions/".to_string(),
        license_name: "Terms and Conditions".to_string(),
        index_kind: IndexKind::Html,
        link_pattern: DEFAULT_LINK_PATTERN.to_string(),
        trip_columns: TripColumnSources {
            started_at: &["start_time"],
            ended_at: &["end_time"],
            start_station_id: &["start_station_id", "start_station"],
            end_station_id: &["end_station_id", "end_station"],
            start_lat: &["start_lat"],
            start_lng: &["start_lon"],
            end_lat: &["end_lat"],
            end_lng: &["end_lon"],
            rideable_type: &["bike_type"],
            user_type: &["passholder_type"],
            bike_id: &["bike_id"],
            ..Default::default()
        }
        .into_specs(),
        station_columns: Some(
            StationColumnSources {
                station_id: &["Station_ID"],
                name: &["Station_Name"],
                created_at: &["Day of Go_live_date"],
                is_active: &["Status"],
                ..Default::default()
            }
            .into_specs(),
        ),
        ignore_columns: column_set(&["trip_route_category", "plan_duration", "trip_id", "duration"]),
    }
}
