use super::{column_set, MarketConfig, DEFAULT_LINK_PATTERN};
use crate::discovery::IndexKind;
use crate::schema::{StationColumnSources, TripColumnSources};

/// Metro's station file has no header row. Its first station is read as the
/// header, so the station "columns" below are that station's values.
pub(super) fn config() -> MarketConfig {
    MarketConfig {
        name: "metro_bike_share".to_string(),
        data_url: "https://bikeshare.metro.net/about/data/".to_string(),
        info_url: "https://bikeshare.metro.net/about/data/".to_string(),
        license_url: "https://bikeshare.metro.net/terms-and-conditions/".to_string(),
        license_name: "Terms and Conditions".to_string(),
        index_kind: IndexKind::Html,
        link_pattern: DEFAULT_LINK_PATTERN.to_string(),
        trip_columns: TripColumnSources {
            started_at: &["start_time"],
            ended_at: &["end_time"],
            start_station_id: &["start_station_id", "start_station"],
            end_station_id: &["end_station_id", "end_station"],
            start_station_name: &["start station name"],
            end_station_name: &["end station name"],
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
                station_id: &["3000"],
                name: &["Virtual Station"],
                created_at: &["7/7/2016"],
                is_active: &["Active"],
                ..Default::default()
            }
            .into_specs(),
        ),
        ignore_columns: column_set(&[
            "trip_id",
            "duration",
            "plan_duration",
            "trip_route_category",
            // region column of the station file
            "N/A",
        ]),
    }
}
