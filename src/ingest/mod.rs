/// Upstream data acquisition for the telemetry service.
///
/// Submodules:
/// - `wmis` — client and normalizers for the Victorian WMIS water data API.

pub mod wmis;
