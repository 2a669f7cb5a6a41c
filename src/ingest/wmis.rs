/// WMIS (Water Measurement Information System) API client
///
/// Retrieves gauge telemetry from the Victorian water data service at
/// data.water.vic.gov.au. The service speaks three distinct protocols:
///
/// - trace queries (`get_ts_traces` against `cgi/webservice.exe`, with the
///   query parameters JSON-encoded directly into the URL string),
/// - fixed latest-12-month resources per station
///   (`stations/0/<id>/<resource>/latest 12 months.json`),
/// - latest multi-parameter snapshots (`stations/0/<id>/latest.json`).
///
/// This module builds the URLs, performs the single network call per
/// invocation (no retries), and normalizes the two time-series response
/// shapes into `Observation` sequences. Normalization never fails: a
/// payload missing the expected structure at any depth degrades to an
/// empty sequence.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Serialize;
use serde_json::Value;

use crate::model::{Observation, WmisError};

// ============================================================================
// URL Construction
// ============================================================================

/// Query parameters for a `get_ts_traces` request. The upstream CGI expects
/// this object serialized as JSON and appended verbatim after the `?`.
#[derive(Serialize)]
struct TraceQueryParams<'a> {
    function: &'static str,
    site_list: &'a str,
    datasource: &'static str,
    varfrom: &'a str,
    varto: &'a str,
    start_time: String,
    end_time: String,
    data_type: &'static str,
    interval: &'static str,
    multiplier: u32,
}

/// Builds a trace-form (shape A) URL: daily mean of one variable over an
/// explicit date range, from datasource "A".
pub fn build_trace_url(
    base_url: &str,
    numeric_site_id: &str,
    variable: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> String {
    let params = TraceQueryParams {
        function: "get_ts_traces",
        site_list: numeric_site_id,
        datasource: "A",
        varfrom: variable,
        varto: variable,
        start_time: start.format("%Y-%m-%d").to_string(),
        end_time: end.format("%Y-%m-%d").to_string(),
        data_type: "mean",
        interval: "day",
        multiplier: 1,
    };
    // Serializing a struct of strings and integers cannot fail.
    let query = serde_json::to_string(&params).unwrap_or_default();
    format!("{}/cgi/webservice.exe?{}", base_url, query)
}

/// Builds a tuple-form (shape B) URL: the provider-windowed trailing
/// 12-month resource. The space in the resource name is literal and
/// pre-encoded. `resource` is `streamflow` or `streamwaterlevel`.
pub fn build_latest_window_url(base_url: &str, numeric_site_id: &str, resource: &str) -> String {
    format!(
        "{}/data/anon/internet/stations/0/{}/{}/latest%2012%20months.json",
        base_url, numeric_site_id, resource
    )
}

/// Builds a snapshot (shape C) URL: the station's latest reading per sensor.
pub fn build_snapshot_url(base_url: &str, numeric_site_id: &str) -> String {
    format!(
        "{}/data/anon/internet/stations/0/{}/latest.json",
        base_url, numeric_site_id
    )
}

// ============================================================================
// Fetch
// ============================================================================

/// Performs exactly one GET against a WMIS URL and returns the decoded JSON
/// body. Does not retry. Transport failures, non-2xx statuses, and
/// undecodable bodies map to the three `WmisError` variants; the caller
/// decides how to degrade.
pub async fn fetch_raw(client: &reqwest::Client, url: &str) -> Result<Value, WmisError> {
    let response = client
        .get(url)
        .header("Accept", "application/json")
        .send()
        .await
        .map_err(|e| WmisError::Transport(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(WmisError::HttpStatus(status.as_u16()));
    }

    response
        .json::<Value>()
        .await
        .map_err(|e| WmisError::MalformedPayload(e.to_string()))
}

// ============================================================================
// Normalization
// ============================================================================

/// Normalizes a trace-form response: `return.traces[0].trace[]` of
/// `{t, v}`. Any missing level of that path yields an empty sequence.
/// A point with a non-numeric `v` keeps its slot with a NaN value; a point
/// with no usable `t` is dropped (there is nothing to plot it against).
pub fn parse_trace_response(payload: &Value) -> Vec<Observation> {
    let Some(trace) = payload
        .get("return")
        .and_then(|r| r.get("traces"))
        .and_then(|t| t.as_array())
        .and_then(|t| t.first())
        .and_then(|t| t.get("trace"))
        .and_then(|t| t.as_array())
    else {
        return Vec::new();
    };

    trace
        .iter()
        .filter_map(|point| {
            let dt = point.get("t")?.as_str()?.to_string();
            let value = point.get("v").map(parse_numeric).unwrap_or(f64::NAN);
            Some(Observation {
                timestamp: parse_timestamp(&dt),
                dt,
                value,
            })
        })
        .collect()
}

/// Normalizes a tuple-form response: a top-level `data[]` of two-element
/// `[isoTimestamp, numericString]` rows. An absent `data` field yields an
/// empty sequence. Values that fail numeric parse become NaN and are kept;
/// validity filtering is a presentation concern, not a normalization one.
pub fn parse_tuple_response(payload: &Value) -> Vec<Observation> {
    let Some(rows) = payload.get("data").and_then(|d| d.as_array()) else {
        return Vec::new();
    };

    rows.iter()
        .filter_map(|row| {
            let row = row.as_array()?;
            let dt = row.first()?.as_str()?.to_string();
            let value = row.get(1).map(parse_numeric).unwrap_or(f64::NAN);
            Some(Observation {
                timestamp: parse_timestamp(&dt),
                dt,
                value,
            })
        })
        .collect()
}

fn parse_numeric(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        Value::String(s) => s.trim().parse().unwrap_or(f64::NAN),
        _ => f64::NAN,
    }
}

/// Parses the timestamp formats WMIS emits: ISO 8601 with an offset,
/// local date-time with optional fractional seconds, or a bare date
/// (interpreted as midnight).
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_local());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(dt);
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

// ============================================================================
// Tests
// ============================================================================
