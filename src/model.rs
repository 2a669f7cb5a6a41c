/// Core data types for the river telemetry aggregation service.
///
/// This module defines the shared domain model imported by all other
/// modules. It contains no I/O — only types and their conversions.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Metric kinds
// ---------------------------------------------------------------------------

/// The closed set of metric families served to the presentation layer.
///
/// Each kind maps to exactly one WMIS protocol and one normalization
/// pipeline; see `router::protocol_for` for the dispatch table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKind {
    /// Streamflow (discharge), ML/day. Tuple-form latest-12-months resource.
    Flow,
    /// Stream water level, metres. Tuple-form latest-12-months resource.
    WaterLevel,
    /// Dissolved oxygen, mg/L. Trace-form daily-mean query.
    DissolvedOxygen,
    /// Electrical conductivity, µS/cm. Trace-form daily-mean query.
    Conductivity,
    /// Multi-parameter latest readings, one per physical sensor.
    LatestSnapshot,
}

// ---------------------------------------------------------------------------
// Observation types
// ---------------------------------------------------------------------------

/// A single normalized measurement from a WMIS time-series response.
///
/// The original timestamp string is preserved verbatim for the UI contract;
/// `timestamp` is the parsed form used for recency filtering and is `None`
/// when the upstream string is not a recognizable ISO 8601 date.
/// Timestamps are not guaranteed monotonic by upstream — out-of-order and
/// duplicate entries are carried through as-is.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub dt: String,
    pub value: f64,
    pub timestamp: Option<NaiveDateTime>,
}

impl Observation {
    pub fn into_point(self) -> ChartPoint {
        ChartPoint {
            dt: self.dt,
            v: self.value,
        }
    }
}

/// One point of the `{dt, v}` series the chart layer renders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub dt: String,
    pub v: f64,
}

// ---------------------------------------------------------------------------
// Snapshot types
// ---------------------------------------------------------------------------

/// One entry of a station's `latest.json` response: the most recent reading
/// from a single physical sensor. Passed through to the UI without
/// normalization; fields missing upstream default to empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotReading {
    #[serde(rename = "parameterLabel", default)]
    pub parameter_label: String,
    #[serde(default)]
    pub v: Option<SnapshotValue>,
    #[serde(default)]
    pub units: String,
    #[serde(default)]
    pub dt: String,
}

/// Snapshot values arrive as numbers for most sensors but as strings for
/// some qualitative parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SnapshotValue {
    Number(f64),
    Text(String),
}

// ---------------------------------------------------------------------------
// Router output
// ---------------------------------------------------------------------------

/// The payload returned for one (station, metric) request. Immutable once
/// returned; a cache refresh supersedes the previous payload rather than
/// mutating it.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricPayload {
    Series(Vec<ChartPoint>),
    Snapshot(Vec<SnapshotReading>),
}

impl MetricPayload {
    /// The empty result a failed fetch degrades to, shaped for the metric.
    pub fn empty_for(metric: MetricKind) -> Self {
        match metric {
            MetricKind::LatestSnapshot => MetricPayload::Snapshot(Vec::new()),
            _ => MetricPayload::Series(Vec::new()),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            MetricPayload::Series(points) => points.is_empty(),
            MetricPayload::Snapshot(readings) => readings.is_empty(),
        }
    }

    /// Unwraps a series payload; a snapshot payload yields an empty series.
    pub fn into_series(self) -> Vec<ChartPoint> {
        match self {
            MetricPayload::Series(points) => points,
            MetricPayload::Snapshot(_) => Vec::new(),
        }
    }

    /// Unwraps a snapshot payload; a series payload yields no readings.
    pub fn into_snapshot(self) -> Vec<SnapshotReading> {
        match self {
            MetricPayload::Snapshot(readings) => readings,
            MetricPayload::Series(_) => Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can arise when fetching WMIS data.
///
/// All variants are handled identically at the router boundary: logged with
/// station and metric context, then converted to an empty result for that
/// one metric request. No variant is fatal and none crosses metric
/// boundaries.
#[derive(Debug, Clone, PartialEq)]
pub enum WmisError {
    /// The request could not be completed (unreachable host, timeout).
    Transport(String),
    /// Non-2xx HTTP response from the WMIS API.
    HttpStatus(u16),
    /// The response body was not the expected JSON shape.
    MalformedPayload(String),
}

impl std::fmt::Display for WmisError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WmisError::Transport(msg) => write!(f, "Transport failure: {}", msg),
            WmisError::HttpStatus(code) => write!(f, "HTTP error: {}", code),
            WmisError::MalformedPayload(msg) => write!(f, "Malformed payload: {}", msg),
        }
    }
}

impl std::error::Error for WmisError {}
