/// Recency windowing for normalized time series.
///
/// The displayed history is bounded to a trailing window (3 months in
/// production) anchored at request time. "Now" is captured once per
/// request at the service entry point and threaded through explicitly, so
/// a single request filters against one consistent cutoff even when
/// interleaved with slow I/O — and so tests can pin the clock.

use chrono::{Months, NaiveDateTime};

use crate::model::Observation;

/// The inclusive lower bound of the recency window ending at `now`.
pub fn cutoff(now: NaiveDateTime, window_months: u32) -> NaiveDateTime {
    // Subtraction only fails at the edge of chrono's representable range;
    // an empty window is the sane result there.
    now.checked_sub_months(Months::new(window_months)).unwrap_or(now)
}

/// Retains observations at or after `cutoff`, preserving input order.
/// Observations whose timestamp did not parse never satisfy the bound and
/// are dropped, matching how an invalid date behaves in the UI layer this
/// contract was lifted from. No re-sorting is performed.
pub fn filter_recent(observations: Vec<Observation>, cutoff: NaiveDateTime) -> Vec<Observation> {
    observations
        .into_iter()
        .filter(|obs| obs.timestamp.is_some_and(|t| t >= cutoff))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
