//! Canonical record types shared by every operator
//!
//! Every bikeshare operator publishes its exports in a different CSV layout.
//! Ingestion folds all of them into these two fixed schemas; only the way each
//! column is populated varies per operator.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ============================================================================
// Canonical Column Names
// ============================================================================

/// Column names of the canonical trip table.
pub mod trip_columns {
    pub const RIDE_ID: &str = "ride_id";
    pub const STARTED_AT: &str = "started_at";
    pub const ENDED_AT: &str = "ended_at";
    pub const START_STATION_ID: &str = "start_station_id";
    pub const END_STATION_ID: &str = "end_station_id";
    pub const START_STATION_NAME: &str = "start_station_name";
    pub const END_STATION_NAME: &str = "end_station_name";
    pub const START_LAT: &str = "start_lat";
    pub const START_LNG: &str = "start_lng";
    pub const END_LAT: &str = "end_lat";
    pub const END_LNG: &str = "end_lng";
    pub const RIDEABLE_TYPE: &str = "rideable_type";
    pub const USER_TYPE: &str = "user_type";
    pub const GENDER: &str = "gender";
    pub const BIKE_ID: &str = "bike_id";
    pub const BIRTH_YEAR: &str = "birth_year";

    /// Every canonical trip column, in output order
    pub const ALL: [&str; 16] = [
        RIDE_ID,
        STARTED_AT,
        ENDED_AT,
        START_STATION_ID,
        END_STATION_ID,
        START_STATION_NAME,
        END_STATION_NAME,
        START_LAT,
        START_LNG,
        END_LAT,
        END_LNG,
        RIDEABLE_TYPE,
        USER_TYPE,
        GENDER,
        BIKE_ID,
        BIRTH_YEAR,
    ];
}

/// Column names of the canonical station table.
pub mod station_columns {
    pub const STATION_ID: &str = "station_id";
    pub const NAME: &str = "name";
    pub const LAT: &str = "lat";
    pub const LNG: &str = "lng";
    pub const CREATED_AT: &str = "created_at";
    pub const IS_ACTIVE: &str = "is_active";

    /// Every canonical station column, in output order
    pub const ALL: [&str; 6] = [STATION_ID, NAME, LAT, LNG, CREATED_AT, IS_ACTIVE];
}

// ============================================================================
// Records
// ============================================================================

/// One trip in the canonical schema.
///
/// Field order matches [`trip_columns::ALL`] so a CSV writer emits the
/// canonical header. `started_at` is optional only until the malformed-row
/// filter runs; trips written to output always carry it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TripRecord {
    pub ride_id: Option<String>,
    pub started_at: Option<NaiveDateTime>,
    pub ended_at: Option<NaiveDateTime>,
    pub start_station_id: Option<String>,
    pub end_station_id: Option<String>,
    pub start_station_name: Option<String>,
    pub end_station_name: Option<String>,
    pub start_lat: Option<f64>,
    pub start_lng: Option<f64>,
    pub end_lat: Option<f64>,
    pub end_lng: Option<f64>,
    pub rideable_type: Option<String>,
    pub user_type: Option<String>,
    pub gender: Option<String>,
    pub bike_id: Option<String>,
    pub birth_year: Option<String>,
}

impl TripRecord {
    /// A trip is well-formed once it has a start timestamp
    pub fn is_well_formed(&self) -> bool {
        self.started_at.is_some()
    }
}

/// One station in the canonical schema, keyed by `station_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationRecord {
    pub station_id: String,
    pub name: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub created_at: Option<NaiveDateTime>,
    pub is_active: Option<String>,
}

impl StationRecord {
    pub fn new(station_id: impl Into<String>) -> Self {
        Self {
            station_id: station_id.into(),
            name: None,
            lat: None,
            lng: None,
            created_at: None,
            is_active: None,
        }
    }
}
