/// The surface the presentation layer calls: one request shape per metric
/// family, all infallible from the caller's point of view.
///
/// `TelemetryService` owns the shared HTTP client and the freshness cache.
/// Request time is captured exactly once per call and threaded through the
/// recency filter and the cache freshness check, so a request observes one
/// consistent clock regardless of how its I/O interleaves.

use chrono::{NaiveDateTime, Utc};

use crate::cache::FreshnessCache;
use crate::config::ServiceConfig;
use crate::model::{ChartPoint, MetricKind, MetricPayload, SnapshotReading, WmisError};
use crate::router;
use crate::stations;

pub struct TelemetryService {
    config: ServiceConfig,
    http: reqwest::Client,
    cache: FreshnessCache,
}

impl TelemetryService {
    pub fn new(config: ServiceConfig) -> Result<Self, WmisError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| WmisError::Transport(e.to_string()))?;
        Ok(TelemetryService {
            config,
            http,
            cache: FreshnessCache::new(),
        })
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Fetches one metric for one station, consulting the freshness cache
    /// where the metric's TTL policy allows it.
    pub async fn get_metric(&self, station_id: &str, metric: MetricKind) -> MetricPayload {
        self.get_metric_at(station_id, metric, Utc::now().naive_utc()).await
    }

    /// [`get_metric`](Self::get_metric) with the request clock injected,
    /// for deterministic windowing and freshness checks under test.
    pub async fn get_metric_at(
        &self,
        station_id: &str,
        metric: MetricKind,
        now: NaiveDateTime,
    ) -> MetricPayload {
        match self.config.ttl_for(metric) {
            Some(ttl) => {
                let key = (stations::numeric_site_id(station_id), metric);
                self.cache
                    .get_or_fetch(key, now, ttl, || {
                        router::fetch_metric(&self.http, &self.config, station_id, metric, now)
                    })
                    .await
            }
            // Trace-protocol metrics are always a miss at this layer.
            None => router::fetch_metric(&self.http, &self.config, station_id, metric, now).await,
        }
    }

    /// Streamflow over the trailing display window, `{dt, v}` per day.
    pub async fn streamflow(&self, station_id: &str) -> Vec<ChartPoint> {
        self.get_metric(station_id, MetricKind::Flow).await.into_series()
    }

    /// Stream water level over the trailing display window.
    pub async fn water_level(&self, station_id: &str) -> Vec<ChartPoint> {
        self.get_metric(station_id, MetricKind::WaterLevel).await.into_series()
    }

    /// Daily mean electrical conductivity over the trailing display window.
    pub async fn conductivity(&self, station_id: &str) -> Vec<ChartPoint> {
        self.get_metric(station_id, MetricKind::Conductivity).await.into_series()
    }

    /// Daily mean dissolved oxygen over the trailing display window.
    pub async fn dissolved_oxygen(&self, station_id: &str) -> Vec<ChartPoint> {
        self.get_metric(station_id, MetricKind::DissolvedOxygen).await.into_series()
    }

    /// The station's most recent reading per sensor, passed through raw.
    pub async fn latest_snapshot(&self, station_id: &str) -> Vec<SnapshotReading> {
        self.get_metric(station_id, MetricKind::LatestSnapshot)
            .await
            .into_snapshot()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn unreachable_service() -> TelemetryService {
        TelemetryService::new(ServiceConfig {
            base_url: "http://127.0.0.1:9/WMIS".to_string(),
            request_timeout_secs: 2,
            ..ServiceConfig::default()
        })
        .unwrap()
    }

    fn fixed_now() -> NaiveDateTime {
        chrono::NaiveDate::from_ymd_opt(2024, 6, 10)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[tokio::test]
    async fn test_every_surface_returns_empty_on_upstream_failure() {
        let service = unreachable_service();
        assert!(service.streamflow("415247B").await.is_empty());
        assert!(service.water_level("415247B").await.is_empty());
        assert!(service.conductivity("415247B").await.is_empty());
        assert!(service.dissolved_oxygen("415247B").await.is_empty());
        assert!(service.latest_snapshot("415247B").await.is_empty());
    }

    #[tokio::test]
    async fn test_suffixed_and_numeric_ids_share_a_cache_entry() {
        // Both spellings resolve to the same numeric key, so the second
        // call is a cache hit on the (empty) payload the first stored.
        let service = unreachable_service();
        let now = fixed_now();
        let first = service.get_metric_at("415247B", MetricKind::Flow, now).await;
        let second = service.get_metric_at("415247", MetricKind::Flow, now).await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_failure_result_is_cached_until_ttl_elapses() {
        // Within the TTL the cached empty payload is served without a new
        // upstream attempt; this stays cheap even though upstream is down.
        let service = unreachable_service();
        let now = fixed_now();
        let first = service.get_metric_at("415247B", MetricKind::LatestSnapshot, now).await;
        assert!(first.is_empty());
        let within_ttl = service
            .get_metric_at("415247B", MetricKind::LatestSnapshot, now + Duration::minutes(4))
            .await;
        assert!(within_ttl.is_empty());
    }
}
