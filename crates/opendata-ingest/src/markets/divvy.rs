use super::{column_set, MarketConfig, DEFAULT_LINK_PATTERN};
use crate::discovery::IndexKind;
use crate::schema::TripColumnSources;

/// Divvy archives also bundle old station snapshots; their columns are ignored
/// because the trip files carry names and coordinates directly.
pub(super) fn config() -> MarketConfig {
    MarketConfig {
        name: "divvy".to_string(),
        data_url: "https://divvy-tripdata.s3.amazonaws.com/index.html".to_string(),
        info_url: "https://www.divvybikes.com/system-data".to_string(),
        license_url: "https://www.divvybikes.com/data-license-agreement".to_string(),
        license_name: "Divvy Data License Agreement".to_string(),
        index_kind: IndexKind::S3Listing,
        link_pattern: DEFAULT_LINK_PATTERN.to_string(),
        trip_columns: TripColumnSources {
            ride_id: &["ride_id", "trip_id", "01 - Rental Details Rental ID"],
            started_at: &[
                "started_at",
                "start_time",
                "starttime",
                "01 - Rental Details Local Start Time",
            ],
            ended_at: &[
                "ended_at",
                "end_time",
                "stoptime",
                "01 - Rental Details Local End Time",
            ],
            start_station_id: &[
                "start_station_id",
                "from_station_id",
                "03 - Rental Start Station ID",
            ],
            end_station_id: &[
                "end_station_id",
                "to_station_id",
                "02 - Rental End Station ID",
            ],
            start_station_name: &[
                "start_station_name",
                "from_station_name",
                "03 - Rental Start Station Name",
            ],
            end_station_name: &[
                "end_station_name",
                "to_station_name",
                "02 - Rental End Station Name",
            ],
            start_lat: &["start_lat", "latitude"],
            start_lng: &["start_lng", "longitude"],
            end_lat: &["end_lat"],
            end_lng: &["end_lng"],
            rideable_type: &["rideable_type"],
            user_type: &["usertype", "User Type", "member_casual"],
            gender: &["Member Gender", "gender"],
            bike_id: &["bikeid", "01 - Rental Details Bike ID"],
            birth_year: &[
                "birthyear",
                "birthday",
                "05 - Member Details Member Birthday Year",
            ],
        }
        .into_specs(),
        station_columns: None,
        ignore_columns: column_set(&[
            "city",
            "landmark",
            "id",
            "dateCreated",
            "tripduration",
            "dpcapacity",
            "online_date",
            "01 - Rental Details Duration In Seconds Uncapped",
            "online date",
            "Unnamed: 7",
            "name",
        ]),
    }
}
