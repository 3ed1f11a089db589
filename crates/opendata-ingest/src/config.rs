//! Ingestion configuration
//!
//! Runtime knobs for a market run: where archives are cached, how hard the
//! downloader may hit an operator, and how long discovery waits for an index
//! page. Values come from defaults, then `OPENDATA_*` environment variables
//! (a `.env` file is honoured).

use crate::error::{IngestError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

// ============================================================================
// Ingest Configuration Constants
// ============================================================================

/// Default root of the content-addressed archive cache.
pub const DEFAULT_DATA_DIR: &str = "data";

/// Default number of archive downloads in flight at once.
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Default per-request timeout in seconds (10 minutes for multi-GB archives).
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 600;

/// Default TCP connect timeout in seconds.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default maximum attempts per download.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default time to wait for an index page to list its archives.
pub const DEFAULT_DISCOVERY_TIMEOUT_SECS: u64 = 10;

/// Default delay between index page polls while no links are listed.
pub const DEFAULT_DISCOVERY_POLL_INTERVAL_MS: u64 = 500;

/// Browser user agent; some operators answer 403 without one.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/96.0.4664.55 Safari/537.36";

/// Configuration for a market ingestion run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Cache root; each market caches under `<data_dir>/<market>/`
    pub data_dir: PathBuf,

    /// Maximum concurrent archive downloads
    pub concurrency: usize,

    /// Whole-request timeout for a single download attempt
    pub request_timeout_secs: u64,

    /// Connect timeout for every request
    pub connect_timeout_secs: u64,

    /// Attempts per archive before it is marked unavailable
    pub max_retries: u32,

    /// How long discovery waits for the index page to list links
    pub discovery_timeout_secs: u64,

    /// Delay between index page polls
    pub discovery_poll_interval_ms: u64,

    /// User-Agent header sent with every request
    pub user_agent: String,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            concurrency: DEFAULT_CONCURRENCY,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            max_retries: DEFAULT_MAX_RETRIES,
            discovery_timeout_secs: DEFAULT_DISCOVERY_TIMEOUT_SECS,
            discovery_poll_interval_ms: DEFAULT_DISCOVERY_POLL_INTERVAL_MS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl IngestConfig {
    /// Create new config with builder pattern
    pub fn builder() -> IngestConfigBuilder {
        IngestConfigBuilder::default()
    }

    /// Load configuration from environment and defaults
    ///
    /// Environment variables:
    /// - `OPENDATA_DATA_DIR`
    /// - `OPENDATA_CONCURRENCY`
    /// - `OPENDATA_REQUEST_TIMEOUT_SECS`
    /// - `OPENDATA_CONNECT_TIMEOUT_SECS`
    /// - `OPENDATA_MAX_RETRIES`
    /// - `OPENDATA_DISCOVERY_TIMEOUT_SECS`
    /// - `OPENDATA_DISCOVERY_POLL_INTERVAL_MS`
    /// - `OPENDATA_USER_AGENT`
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Same as [`IngestConfig::from_env`], reading variables through `var`
    pub fn from_vars<F>(var: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let config = Self {
            data_dir: var("OPENDATA_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            concurrency: env_parse(&var, "OPENDATA_CONCURRENCY")?.unwrap_or(defaults.concurrency),
            request_timeout_secs: env_parse(&var, "OPENDATA_REQUEST_TIMEOUT_SECS")?
                .unwrap_or(defaults.request_timeout_secs),
            connect_timeout_secs: env_parse(&var, "OPENDATA_CONNECT_TIMEOUT_SECS")?
                .unwrap_or(defaults.connect_timeout_secs),
            max_retries: env_parse(&var, "OPENDATA_MAX_RETRIES")?.unwrap_or(defaults.max_retries),
            discovery_timeout_secs: env_parse(&var, "OPENDATA_DISCOVERY_TIMEOUT_SECS")?
                .unwrap_or(defaults.discovery_timeout_secs),
            discovery_poll_interval_ms: env_parse(&var, "OPENDATA_DISCOVERY_POLL_INTERVAL_MS")?
                .unwrap_or(defaults.discovery_poll_interval_ms),
            user_agent: var("OPENDATA_USER_AGENT").unwrap_or(defaults.user_agent),
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            return Err(IngestError::validation("Concurrency must be greater than 0"));
        }

        if self.request_timeout_secs == 0 {
            return Err(IngestError::validation("Request timeout must be greater than 0"));
        }

        if self.max_retries == 0 {
            return Err(IngestError::validation("Max retries must be at least 1"));
        }

        if self.discovery_poll_interval_ms == 0 {
            return Err(IngestError::validation("Discovery poll interval must be greater than 0"));
        }

        if self.user_agent.trim().is_empty() {
            return Err(IngestError::validation("User agent cannot be empty"));
        }

        Ok(())
    }

    /// Cache directory for one market
    pub fn market_dir(&self, market_name: &str) -> PathBuf {
        self.data_dir.join(market_name)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn discovery_timeout(&self) -> Duration {
        Duration::from_secs(self.discovery_timeout_secs)
    }

    pub fn discovery_poll_interval(&self) -> Duration {
        Duration::from_millis(self.discovery_poll_interval_ms)
    }

    /// Shared HTTP client for discovery and downloads
    pub fn http_client(&self) -> Result<reqwest::Client> {
        Ok(reqwest::Client::builder()
            .user_agent(self.user_agent.clone())
            .timeout(self.request_timeout())
            .connect_timeout(self.connect_timeout())
            .build()?)
    }
}

fn env_parse<T, F>(var: &F, key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    match var(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| IngestError::validation(format!("{key} has an invalid value: {raw}"))),
        None => Ok(None),
    }
}

/// Builder for IngestConfig
#[derive(Default)]
pub struct IngestConfigBuilder {
    config: IngestConfig,
}

impl IngestConfigBuilder {
    pub fn data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.data_dir = dir.into();
        self
    }

    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.config.concurrency = concurrency;
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs;
        self
    }

    pub fn max_retries(mut self, retries: u32) -> Self {
        self.config.max_retries = retries;
        self
    }

    pub fn discovery_timeout_secs(mut self, secs: u64) -> Self {
        self.config.discovery_timeout_secs = secs;
        self
    }

    pub fn discovery_poll_interval_ms(mut self, millis: u64) -> Self {
        self.config.discovery_poll_interval_ms = millis;
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    pub fn build(self) -> IngestConfig {
        self.config
    }
}
