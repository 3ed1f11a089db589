use super::{column_set, MarketConfig, DEFAULT_LINK_PATTERN};
use crate::discovery::IndexKind;
use crate::schema::{StationColumnSources, TripColumnSources};

/// Bixi publishes trips and a station table in the same archive; trips carry
/// only station codes.
pub(super) fn config() -> MarketConfig {
    MarketConfig {
        name: "bixi".to_string(),
        data_url: "https://bixi.com/en/open-data".to_string(),
        info_url: "https://bixi.com/en/open-data".to_string(),
        license_url: "https://bixi.com/en/website-terms".to_string(),
        license_name: "Terms and Conditions".to_string(),
        index_kind: IndexKind::Html,
        link_pattern: DEFAULT_LINK_PATTERN.to_string(),
        trip_columns: TripColumnSources {
            started_at: &["start_date"],
            ended_at: &["end_date"],
            start_station_id: &["start_station_code", "emplacement_pk_start"],
            end_station_id: &["end_station_code", "emplacement_pk_end"],
            user_type: &["is_member"],
            ..Default::default()
        }
        .into_specs(),
        station_columns: Some(
            StationColumnSources {
                station_id: &["pk", "code", "Code"],
                name: &["name"],
                lat: &["latitude"],
                lng: &["longitude"],
                ..Default::default()
            }
            .into_specs(),
        ),
        ignore_columns: column_set(&["duration_sec"]),
    }
}
