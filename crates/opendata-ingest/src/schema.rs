//! Column specifications
//!
//! A [`ColumnSpec`] says how one canonical column is populated from an
//! operator's export: which source columns may carry it (in priority order)
//! and what type the coalesced value is coerced to.

use opendata_common::types::{station_columns, trip_columns};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Remap target that stands for "no value"; matching inputs become null.
pub const NOT_APPLICABLE: &str = "N/A";

/// How a canonical column is populated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub canonical_name: String,

    /// Source columns consulted in order; the first non-null value wins
    #[serde(default)]
    pub candidate_source_names: Vec<String>,

    pub kind: ColumnKind,
}

impl ColumnSpec {
    pub fn new(canonical_name: &str, sources: &[&str], kind: ColumnKind) -> Self {
        Self {
            canonical_name: canonical_name.to_string(),
            candidate_source_names: sources.iter().map(|s| s.to_string()).collect(),
            kind,
        }
    }
}

/// Target type of a canonical column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ColumnKind {
    Text,
    Float,
    Timestamp,
    /// Free text folded onto a small label set
    Category { remap: ValueRemap },
}

/// Case-insensitive mapping from raw source values onto canonical labels.
///
/// Raw values that match no label are kept as they are.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<String, BTreeSet<String>>",
    into = "BTreeMap<String, BTreeSet<String>>"
)]
pub struct ValueRemap {
    targets: BTreeMap<String, BTreeSet<String>>,
    lookup: HashMap<String, Option<String>>,
}

impl ValueRemap {
    pub fn new<'a>(targets: impl IntoIterator<Item = (&'a str, &'a [&'a str])>) -> Self {
        targets
            .into_iter()
            .map(|(target, sources)| {
                (
                    target.to_string(),
                    sources.iter().map(|s| s.to_string()).collect(),
                )
            })
            .collect::<BTreeMap<_, _>>()
            .into()
    }

    /// Map a raw (non-null) value onto its canonical label
    pub fn apply(&self, raw: &str) -> Option<String> {
        match self.lookup.get(&raw.trim().to_lowercase()) {
            Some(target) => target.clone(),
            None => Some(raw.to_string()),
        }
    }

    pub fn targets(&self) -> &BTreeMap<String, BTreeSet<String>> {
        &self.targets
    }
}

impl From<BTreeMap<String, BTreeSet<String>>> for ValueRemap {
    fn from(targets: BTreeMap<String, BTreeSet<String>>) -> Self {
        let mut lookup = HashMap::new();
        for (target, sources) in &targets {
            let label = (target != NOT_APPLICABLE).then(|| target.clone());
            for source in sources {
                lookup.insert(source.trim().to_lowercase(), label.clone());
            }
        }
        Self { targets, lookup }
    }
}

impl From<ValueRemap> for BTreeMap<String, BTreeSet<String>> {
    fn from(remap: ValueRemap) -> Self {
        remap.targets
    }
}

// ============================================================================
// Canonical Remaps
// ============================================================================

pub fn rideable_type_remap() -> ValueRemap {
    ValueRemap::new([
        ("classic_bike", &["docked_bike", "classic_bike"][..]),
        ("electric_bike", &["electric_bike"][..]),
    ])
}

pub fn gender_remap() -> ValueRemap {
    ValueRemap::new([
        (NOT_APPLICABLE, &["0"][..]),
        ("male", &["1", "male"][..]),
        ("female", &["2", "female"][..]),
    ])
}

/// Bixi reports membership as 0/1, hence the numeric sources
pub fn user_type_remap() -> ValueRemap {
    ValueRemap::new([
        ("casual", &["customer", "casual", "0"][..]),
        ("member", &["subscriber", "member", "1"][..]),
    ])
}

// ============================================================================
// Schema Builders
// ============================================================================

/// Source columns for every canonical trip column of one operator
#[derive(Debug, Clone, Copy, Default)]
pub struct TripColumnSources<'a> {
    pub ride_id: &'a [&'a str],
    pub started_at: &'a [&'a str],
    pub ended_at: &'a [&'a str],
    pub start_station_id: &'a [&'a str],
    pub end_station_id: &'a [&'a str],
    pub start_station_name: &'a [&'a str],
    pub end_station_name: &'a [&'a str],
    pub start_lat: &'a [&'a str],
    pub start_lng: &'a [&'a str],
    pub end_lat: &'a [&'a str],
    pub end_lng: &'a [&'a str],
    pub rideable_type: &'a [&'a str],
    pub user_type: &'a [&'a str],
    pub gender: &'a [&'a str],
    pub bike_id: &'a [&'a str],
    pub birth_year: &'a [&'a str],
}

impl TripColumnSources<'_> {
    /// Full canonical trip schema, in output column order
    pub fn into_specs(self) -> Vec<ColumnSpec> {
        use trip_columns::*;

        vec![
            ColumnSpec::new(RIDE_ID, self.ride_id, ColumnKind::Text),
            ColumnSpec::new(STARTED_AT, self.started_at, ColumnKind::Timestamp),
            ColumnSpec::new(ENDED_AT, self.ended_at, ColumnKind::Timestamp),
            ColumnSpec::new(START_STATION_ID, self.start_station_id, ColumnKind::Text),
            ColumnSpec::new(END_STATION_ID, self.end_station_id, ColumnKind::Text),
            ColumnSpec::new(START_STATION_NAME, self.start_station_name, ColumnKind::Text),
            ColumnSpec::new(END_STATION_NAME, self.end_station_name, ColumnKind::Text),
            ColumnSpec::new(START_LAT, self.start_lat, ColumnKind::Float),
            ColumnSpec::new(START_LNG, self.start_lng, ColumnKind::Float),
            ColumnSpec::new(END_LAT, self.end_lat, ColumnKind::Float),
            ColumnSpec::new(END_LNG, self.end_lng, ColumnKind::Float),
            ColumnSpec::new(
                RIDEABLE_TYPE,
                self.rideable_type,
                ColumnKind::Category {
                    remap: rideable_type_remap(),
                },
            ),
            ColumnSpec::new(
                USER_TYPE,
                self.user_type,
                ColumnKind::Category {
                    remap: user_type_remap(),
                },
            ),
            ColumnSpec::new(
                GENDER,
                self.gender,
                ColumnKind::Category {
                    remap: gender_remap(),
                },
            ),
            ColumnSpec::new(BIKE_ID, self.bike_id, ColumnKind::Text),
            ColumnSpec::new(BIRTH_YEAR, self.birth_year, ColumnKind::Text),
        ]
    }
}

/// Source columns for every canonical station column of one operator
#[derive(Debug, Clone, Copy, Default)]
pub struct StationColumnSources<'a> {
    pub station_id: &'a [&'a str],
    pub name: &'a [&'a str],
    pub lat: &'a [&'a str],
    pub lng: &'a [&'a str],
    pub created_at: &'a [&'a str],
    pub is_active: &'a [&'a str],
}

impl StationColumnSources<'_> {
    pub fn into_specs(self) -> Vec<ColumnSpec> {
        use station_columns::*;

        vec![
            ColumnSpec::new(STATION_ID, self.station_id, ColumnKind::Text),
            ColumnSpec::new(NAME, self.name, ColumnKind::Text),
            ColumnSpec::new(LAT, self.lat, ColumnKind::Float),
            ColumnSpec::new(LNG, self.lng, ColumnKind::Float),
            ColumnSpec::new(CREATED_AT, self.created_at, ColumnKind::Timestamp),
            ColumnSpec::new(IS_ACTIVE, self.is_active, ColumnKind::Text),
        ]
    }
}

/// Union of all source column names a schema consults
pub fn source_columns(specs: &[ColumnSpec]) -> BTreeSet<&str> {
    specs
        .iter()
        .flat_map(|spec| spec.candidate_source_names.iter().map(String::as_str))
        .collect()
}
