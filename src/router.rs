/// Metric routing: the central dispatch and orchestration point.
///
/// Each metric kind maps to one upstream protocol, one endpoint template,
/// and one normalization/filter pipeline; `protocol_for` is that routing
/// table, and `fetch_metric` runs the selected pipeline end to end:
///
///   strip letters → build URL → fetch → normalize → recency-filter → payload
///
/// The tuple-form resources are pre-windowed to 12 months by the provider
/// and re-trimmed here to the 3-month display window; the trace-form query
/// is windowed at the source by an explicit date range, so no post-filter
/// applies. Any upstream failure short-circuits to an empty result for
/// that one metric call — failures never cross metric boundaries and never
/// surface as errors to the presentation layer.

use chrono::NaiveDateTime;
use tracing::{debug, warn};

use crate::config::ServiceConfig;
use crate::ingest::wmis;
use crate::model::{ChartPoint, MetricKind, MetricPayload, Observation, SnapshotReading, WmisError};
use crate::recency;
use crate::stations;

// ---------------------------------------------------------------------------
// Routing table
// ---------------------------------------------------------------------------

/// The upstream protocol and parameters resolved for one metric kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Protocol {
    /// Shape A: parameterized daily-mean trace query, windowed at the
    /// source by an explicit `[now - window, now]` date range.
    TraceQuery { variable: String },
    /// Shape B: fixed trailing 12-month resource, re-trimmed client-side
    /// by the recency filter.
    LatestWindow { resource: &'static str },
    /// Shape C: latest multi-parameter readings, passed through raw.
    Snapshot,
}

pub fn protocol_for(metric: MetricKind, config: &ServiceConfig) -> Protocol {
    match metric {
        MetricKind::Flow => Protocol::LatestWindow {
            resource: "streamflow",
        },
        MetricKind::WaterLevel => Protocol::LatestWindow {
            resource: "streamwaterlevel",
        },
        MetricKind::Conductivity => Protocol::TraceQuery {
            variable: config.conductivity_variable.clone(),
        },
        MetricKind::DissolvedOxygen => Protocol::TraceQuery {
            variable: config.dissolved_oxygen_variable.clone(),
        },
        MetricKind::LatestSnapshot => Protocol::Snapshot,
    }
}

// ---------------------------------------------------------------------------
// Orchestration
// ---------------------------------------------------------------------------

/// Fetches one metric for one station. `now` anchors the recency window and
/// the trace date range; it is captured once at the service entry point.
/// Never returns an error: transport failures, bad statuses, and malformed
/// payloads are logged and degrade to an empty payload of the right shape.
pub async fn fetch_metric(
    http: &reqwest::Client,
    config: &ServiceConfig,
    station_id: &str,
    metric: MetricKind,
    now: NaiveDateTime,
) -> MetricPayload {
    let site = stations::numeric_site_id(station_id);
    match fetch_metric_inner(http, config, &site, metric, now).await {
        Ok(payload) => payload,
        Err(err) => {
            warn!(site = %site, metric = ?metric, error = %err, "upstream fetch failed; serving empty result");
            MetricPayload::empty_for(metric)
        }
    }
}

async fn fetch_metric_inner(
    http: &reqwest::Client,
    config: &ServiceConfig,
    site: &str,
    metric: MetricKind,
    now: NaiveDateTime,
) -> Result<MetricPayload, WmisError> {
    match protocol_for(metric, config) {
        Protocol::TraceQuery { variable } => {
            let start = recency::cutoff(now, config.window_months).date();
            let url = wmis::build_trace_url(&config.base_url, site, &variable, start, now.date());
            let raw = wmis::fetch_raw(http, &url).await?;
            let observations = wmis::parse_trace_response(&raw);
            debug!(site, metric = ?metric, points = observations.len(), "trace fetch complete");
            Ok(MetricPayload::Series(to_points(observations)))
        }
        Protocol::LatestWindow { resource } => {
            let url = wmis::build_latest_window_url(&config.base_url, site, resource);
            let raw = wmis::fetch_raw(http, &url).await?;
            let cutoff = recency::cutoff(now, config.window_months);
            let observations = recency::filter_recent(wmis::parse_tuple_response(&raw), cutoff);
            debug!(site, metric = ?metric, points = observations.len(), "windowed fetch complete");
            Ok(MetricPayload::Series(to_points(observations)))
        }
        Protocol::Snapshot => {
            let url = wmis::build_snapshot_url(&config.base_url, site);
            let raw = wmis::fetch_raw(http, &url).await?;
            let readings: Vec<SnapshotReading> = serde_json::from_value(raw)
                .map_err(|e| WmisError::MalformedPayload(e.to_string()))?;
            debug!(site, readings = readings.len(), "snapshot fetch complete");
            Ok(MetricPayload::Snapshot(readings))
        }
    }
}

fn to_points(observations: Vec<Observation>) -> Vec<ChartPoint> {
    observations.into_iter().map(Observation::into_point).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ServiceConfig {
        ServiceConfig::default()
    }

    #[test]
    fn test_routing_table_matches_metric_families() {
        let config = config();
        assert_eq!(
            protocol_for(MetricKind::Flow, &config),
            Protocol::LatestWindow { resource: "streamflow" }
        );
        assert_eq!(
            protocol_for(MetricKind::WaterLevel, &config),
            Protocol::LatestWindow { resource: "streamwaterlevel" }
        );
        assert_eq!(
            protocol_for(MetricKind::Conductivity, &config),
            Protocol::TraceQuery { variable: "62".to_string() }
        );
        assert_eq!(
            protocol_for(MetricKind::DissolvedOxygen, &config),
            Protocol::TraceQuery { variable: "215".to_string() }
        );
        assert_eq!(protocol_for(MetricKind::LatestSnapshot, &config), Protocol::Snapshot);
    }

    #[test]
    fn test_dissolved_oxygen_variable_is_configurable() {
        let config = ServiceConfig {
            dissolved_oxygen_variable: "2010".to_string(),
            ..ServiceConfig::default()
        };
        assert_eq!(
            protocol_for(MetricKind::DissolvedOxygen, &config),
            Protocol::TraceQuery { variable: "2010".to_string() }
        );
    }

    /// Serves `HTTP/1.1 503 Service Unavailable` to every connection on a
    /// local ephemeral port, returning the base URL to point the config at.
    async fn spawn_unavailable_upstream() -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            loop {
                let Ok((mut stream, _)) = listener.accept().await else {
                    break;
                };
                let mut request = [0u8; 1024];
                let _ = stream.read(&mut request).await;
                let _ = stream
                    .write_all(
                        b"HTTP/1.1 503 Service Unavailable\r\n\
                          content-length: 0\r\n\
                          connection: close\r\n\r\n",
                    )
                    .await;
            }
        });
        format!("http://{}/WMIS", addr)
    }

    #[tokio::test]
    async fn test_error_status_upstream_degrades_to_empty_payload() {
        // A responsive upstream answering 503 must degrade exactly like an
        // unreachable one: empty payload of the metric's shape, no error.
        let config = ServiceConfig {
            base_url: spawn_unavailable_upstream().await,
            ..ServiceConfig::default()
        };
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(2))
            .build()
            .unwrap();
        let now = chrono::NaiveDate::from_ymd_opt(2024, 6, 10)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();

        let flow = fetch_metric(&http, &config, "415247B", MetricKind::Flow, now).await;
        assert_eq!(flow, MetricPayload::Series(Vec::new()));

        let conductivity = fetch_metric(&http, &config, "415247B", MetricKind::Conductivity, now).await;
        assert_eq!(conductivity, MetricPayload::Series(Vec::new()));

        let snapshot = fetch_metric(&http, &config, "415247B", MetricKind::LatestSnapshot, now).await;
        assert_eq!(snapshot, MetricPayload::Snapshot(Vec::new()));
    }

    #[tokio::test]
    async fn test_unreachable_upstream_degrades_to_empty_payload() {
        // Nothing listens on the discard port; the transport error must be
        // swallowed into an empty payload of the metric's shape.
        let config = ServiceConfig {
            base_url: "http://127.0.0.1:9/WMIS".to_string(),
            ..ServiceConfig::default()
        };
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(2))
            .build()
            .unwrap();
        let now = chrono::NaiveDate::from_ymd_opt(2024, 6, 10)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();

        let flow = fetch_metric(&http, &config, "415247B", MetricKind::Flow, now).await;
        assert_eq!(flow, MetricPayload::Series(Vec::new()));

        let snapshot = fetch_metric(&http, &config, "415247B", MetricKind::LatestSnapshot, now).await;
        assert_eq!(snapshot, MetricPayload::Snapshot(Vec::new()));
    }

    #[tokio::test]
    async fn test_metric_failures_are_isolated() {
        // A failing conductivity fetch must not poison a later flow fetch
        // for the same station (both fail here, but independently and each
        // to its own empty payload).
        let config = ServiceConfig {
            base_url: "http://127.0.0.1:9/WMIS".to_string(),
            ..ServiceConfig::default()
        };
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(2))
            .build()
            .unwrap();
        let now = chrono::NaiveDate::from_ymd_opt(2024, 6, 10)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();

        let conductivity = fetch_metric(&http, &config, "415247B", MetricKind::Conductivity, now).await;
        let flow = fetch_metric(&http, &config, "415247B", MetricKind::Flow, now).await;
        assert!(conductivity.is_empty());
        assert!(flow.is_empty());
    }
}
