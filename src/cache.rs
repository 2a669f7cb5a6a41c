/// Freshness cache with single-flight request collapsing.
///
/// The map UI fetches metrics per marker interaction, so a hover burst can
/// issue the same (station, metric) request several times before the first
/// upstream call completes. This cache memoizes router output under a
/// metric-specific TTL and collapses those concurrent duplicates into one
/// upstream call — a concurrency requirement, not an optimization.
///
/// Locking is two-level: a plain mutex guards the key→slot map (held only
/// for lookup/insert), and each slot carries its own async mutex. A caller
/// holds the slot lock across its fetch, so same-key callers that arrive
/// mid-flight queue on the slot and then observe the freshly stored entry
/// instead of fetching again. Distinct keys never contend beyond the brief
/// map lock.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

use chrono::{Duration, NaiveDateTime};

use crate::model::{MetricKind, MetricPayload};

/// Cache key: canonical numeric station id plus metric family.
pub type CacheKey = (String, MetricKind);

#[derive(Debug, Clone)]
struct CacheEntry {
    payload: MetricPayload,
    expires_at: NaiveDateTime,
}

type Slot = Arc<tokio::sync::Mutex<Option<CacheEntry>>>;

#[derive(Default)]
pub struct FreshnessCache {
    slots: Mutex<HashMap<CacheKey, Slot>>,
}

impl FreshnessCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached payload for `key` while `now < fetched_at + ttl`;
    /// otherwise awaits `fetch`, stores its result with `fetched_at = now`,
    /// and returns it. An empty result is cached like any other, which
    /// keeps a data-less station from hammering upstream.
    pub async fn get_or_fetch<F, Fut>(
        &self,
        key: CacheKey,
        now: NaiveDateTime,
        ttl: Duration,
        fetch: F,
    ) -> MetricPayload
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = MetricPayload>,
    {
        let slot = {
            let mut slots = self.slots.lock().unwrap();
            slots.entry(key).or_default().clone()
        };

        let mut entry = slot.lock().await;
        if let Some(cached) = entry.as_ref() {
            if now < cached.expires_at {
                return cached.payload.clone();
            }
        }

        let payload = fetch().await;
        *entry = Some(CacheEntry {
            payload: payload.clone(),
            expires_at: now + ttl,
        });
        drop(entry);

        // The surface accepts arbitrary station ids, so without a sweep the
        // map would retain one slot per distinct key forever. Inserts are
        // rare (one per expiry), so this is the cheap place to collect.
        self.prune_expired(now);
        payload
    }

    /// Drops slots whose entry has expired. Slots currently locked by an
    /// in-flight fetch, and slots whose fetch has not yet stored a result,
    /// are left alone.
    fn prune_expired(&self, now: NaiveDateTime) {
        let mut slots = self.slots.lock().unwrap();
        slots.retain(|_, slot| match slot.try_lock() {
            Ok(entry) => entry.as_ref().map_or(true, |cached| now < cached.expires_at),
            Err(_) => true,
        });
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
