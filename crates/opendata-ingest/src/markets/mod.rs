//! Supported bikeshare markets
//!
//! Each operator is described by a static [`MarketConfig`]: where its archives
//! are listed, how the listing is read, and how its CSV columns map onto the
//! canonical schema. Operators not built in can be described in a TOML file
//! and loaded with [`MarketConfig::from_toml_file`].

mod bay_wheels;
mod bixi;
mod bluebikes;
mod capital_bikeshare;
mod citi_bike;
mod cogo;
mod divvy;
mod indego;
mod metro_bike_share;
mod niceride;

use crate::discovery::IndexKind;
use crate::error::{IngestError, Result};
use crate::schema::{source_columns, ColumnSpec};
use opendata_common::types::{station_columns, trip_columns};
use opendata_common::OpendataError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Default pattern selecting archive links on an index page
pub const DEFAULT_LINK_PATTERN: &str = r"\.zip$";

/// Built-in markets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum Market {
    BayWheels,
    Bixi,
    Bluebikes,
    CapitalBikeshare,
    CitiBike,
    Cogo,
    Divvy,
    Indego,
    MetroBikeShare,
    Niceride,
}

impl Market {
    pub const ALL: [Market; 10] = [
        Market::BayWheels,
        Market::Bixi,
        Market::Bluebikes,
        Market::CapitalBikeshare,
        Market::CitiBike,
        Market::Cogo,
        Market::Divvy,
        Market::Indego,
        Market::MetroBikeShare,
        Market::Niceride,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Market::BayWheels => "bay_wheels",
            Market::Bixi => "bixi",
            Market::Bluebikes => "bluebikes",
            Market::CapitalBikeshare => "capital_bikeshare",
            Market::CitiBike => "citi_bike",
            Market::Cogo => "cogo",
            Market::Divvy => "divvy",
            Market::Indego => "indego",
            Market::MetroBikeShare => "metro_bike_share",
            Market::Niceride => "niceride",
        }
    }

    /// Static configuration for this market
    pub fn config(&self) -> MarketConfig {
        match self {
            Market::BayWheels => bay_wheels::config(),
            Market::Bixi => bixi::config(),
            Market::Bluebikes => bluebikes::config(),
            Market::CapitalBikeshare => capital_bikeshare::config(),
            Market::CitiBike => citi_bike::config(),
            Market::Cogo => cogo::config(),
            Market::Divvy => divvy::config(),
            Market::Indego => indego::config(),
            Market::MetroBikeShare => metro_bike_share::config(),
            Market::Niceride => niceride::config(),
        }
    }
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Market {
    type Err = OpendataError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Market::ALL
            .into_iter()
            .find(|market| market.as_str() == s)
            .ok_or_else(|| OpendataError::UnknownMarket(s.to_string()))
    }
}

/// Everything needed to ingest one operator's published trip history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketConfig {
    /// Snake-case identifier, also the cache subdirectory name
    pub name: String,

    /// Page (or bucket index) listing the archives
    pub data_url: String,

    pub info_url: String,
    pub license_url: String,
    pub license_name: String,

    #[serde(default)]
    pub index_kind: IndexKind,

    #[serde(default = "default_link_pattern")]
    pub link_pattern: String,

    pub trip_columns: Vec<ColumnSpec>,

    /// Present only for operators that also publish a station table
    #[serde(default)]
    pub station_columns: Option<Vec<ColumnSpec>>,

    /// Source columns known to exist but deliberately not used
    #[serde(default)]
    pub ignore_columns: BTreeSet<String>,
}

fn default_link_pattern() -> String {
    DEFAULT_LINK_PATTERN.to_string()
}

impl MarketConfig {
    /// Load a market definition from a TOML file
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn link_regex(&self) -> Result<Regex> {
        Ok(Regex::new(&self.link_pattern)?)
    }

    /// `<name>.csv`, the file totals are later read from
    pub fn default_output_path(&self) -> PathBuf {
        PathBuf::from(format!("{}.csv", self.name))
    }

    pub fn has_stations(&self) -> bool {
        self.station_columns.is_some()
    }

    /// Every source column either schema consults
    pub fn known_source_columns(&self) -> BTreeSet<&str> {
        let mut columns = source_columns(&self.trip_columns);
        if let Some(ref stations) = self.station_columns {
            columns.extend(source_columns(stations));
        }
        columns
    }

    /// Validate the definition
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(IngestError::validation("Market name cannot be empty"));
        }

        url::Url::parse(&self.data_url)?;
        self.link_regex()?;

        if !self
            .trip_columns
            .iter()
            .any(|spec| spec.canonical_name == trip_columns::STARTED_AT)
        {
            return Err(IngestError::validation(format!(
                "Market {} has no {} column",
                self.name,
                trip_columns::STARTED_AT
            )));
        }

        if let Some(ref stations) = self.station_columns {
            if !stations
                .iter()
                .any(|spec| spec.canonical_name == station_columns::STATION_ID)
            {
                return Err(IngestError::validation(format!(
                    "Market {} has a station table without {}",
                    self.name,
                    station_columns::STATION_ID
                )));
            }
        }

        Ok(())
    }
}

fn column_set(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|name| name.to_string()).collect()
}
