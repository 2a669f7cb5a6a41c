/// Service configuration, loadable from a TOML file.
///
/// Every field has a default matching production WMIS behavior, so an
/// absent or partial config file still yields a working service.

use chrono::Duration;
use serde::Deserialize;

use crate::model::MetricKind;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Base URL of the WMIS service, no trailing slash.
    pub base_url: String,
    /// Trailing recency window applied to time-series metrics, in months.
    pub window_months: u32,
    /// WMIS variable code for electrical conductivity (trace protocol).
    pub conductivity_variable: String,
    /// WMIS variable code for dissolved oxygen (trace protocol).
    pub dissolved_oxygen_variable: String,
    /// Per-request timeout on the shared HTTP client, in seconds.
    pub request_timeout_secs: u64,
    /// Cache TTL for flow and water level series, in minutes.
    pub series_ttl_minutes: i64,
    /// Cache TTL for the latest-readings snapshot, in minutes.
    pub snapshot_ttl_minutes: i64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        ServiceConfig {
            base_url: "https://data.water.vic.gov.au/WMIS".to_string(),
            window_months: 3,
            conductivity_variable: "62".to_string(),
            dissolved_oxygen_variable: "215".to_string(),
            request_timeout_secs: 30,
            series_ttl_minutes: 60,
            snapshot_ttl_minutes: 5,
        }
    }
}

impl ServiceConfig {
    /// Parses a config from TOML text. Unknown keys are ignored; missing
    /// keys take their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Loads a config from a TOML file on disk.
    pub fn load(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let text = std::fs::read_to_string(path)?;
        Ok(Self::from_toml_str(&text)?)
    }

    /// The freshness-cache TTL for a metric, or `None` for metrics that are
    /// always a miss at this layer (trace-protocol metrics are windowed at
    /// the source per request, so caching is left to the HTTP layer).
    pub fn ttl_for(&self, metric: MetricKind) -> Option<Duration> {
        match metric {
            MetricKind::Flow | MetricKind::WaterLevel => {
                Some(Duration::minutes(self.series_ttl_minutes))
            }
            MetricKind::LatestSnapshot => Some(Duration::minutes(self.snapshot_ttl_minutes)),
            MetricKind::Conductivity | MetricKind::DissolvedOxygen => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
