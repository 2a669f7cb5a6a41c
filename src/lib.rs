//! Station telemetry aggregation layer for the Wimmera river gauge map.
//!
//! Fetches raw observations from the Victorian WMIS hydrological data
//! service, normalizes its heterogeneous response shapes into a uniform
//! time-series representation, applies recency windowing, and serves the
//! result to the presentation layer with freshness-based caching.
//!
//! The map UI consumes this crate through [`TelemetryService`], one request
//! shape per metric family. Upstream failures never escape that surface:
//! a station with unreachable data yields an empty result, not an error.

pub mod cache;
pub mod config;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod recency;
pub mod router;
pub mod service;
pub mod stations;

pub use config::ServiceConfig;
pub use model::{ChartPoint, MetricKind, MetricPayload, SnapshotReading, SnapshotValue, WmisError};
pub use service::TelemetryService;
