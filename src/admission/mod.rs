//! Per-caller cooldown gate in front of expensive downstream work.
//!
//! Each caller identity maps to the millisecond timestamp of its last granted
//! request. Entries never expire individually; the whole table is cleared on a
//! schedule by [`AdmissionController::spawn_sweeper`].

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use time::OffsetDateTime;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Cooldown applied between two vision calls of the same caller.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_millis(4_000);

/// Interval between full-table sweeps.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(300);

#[derive(Debug, Clone, Default)]
pub struct AdmissionController {
    last_access: Arc<DashMap<String, i64>>,
}

impl AdmissionController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grant or reject `caller_id` against `cooldown` as of the current time.
    pub fn is_allowed(&self, caller_id: &str, cooldown: Duration) -> bool {
        self.is_allowed_at(caller_id, cooldown, now_millis())
    }

    /// Grant or reject `caller_id` as of `now_ms` (Unix milliseconds).
    ///
    /// The decision and the timestamp update happen under the caller's entry
    /// lock, so concurrent first calls for one identity grant exactly once. A
    /// clock that moved backwards counts as still cooling down.
    pub fn is_allowed_at(&self, caller_id: &str, cooldown: Duration, now_ms: i64) -> bool {
        let cooldown_ms = i64::try_from(cooldown.as_millis()).unwrap_or(i64::MAX);

        let allowed = match self.last_access.entry(caller_id.to_owned()) {
            Entry::Vacant(vacant) => {
                vacant.insert(now_ms);
                true
            }
            Entry::Occupied(mut occupied) => {
                let elapsed = now_ms.saturating_sub(*occupied.get());
                if elapsed < cooldown_ms {
                    false
                } else {
                    occupied.insert(now_ms);
                    true
                }
            }
        };

        if allowed {
            metrics::counter!("courier_intake_admission_granted_total").increment(1);
        } else {
            debug!(caller_id, cooldown_ms, "admission denied");
            metrics::counter!("courier_intake_admission_denied_total").increment(1);
        }

        allowed
    }

    /// Last granted timestamp for `caller_id`, if any.
    pub fn last_access(&self, caller_id: &str) -> Option<i64> {
        self.last_access.get(caller_id).map(|entry| *entry)
    }

    pub fn tracked_callers(&self) -> usize {
        self.last_access.len()
    }

    /// Forget every caller. Returns how many entries were dropped.
    pub fn clear(&self) -> usize {
        let dropped = self.last_access.len();
        self.last_access.clear();
        metrics::counter!("courier_intake_admission_cleared_total").increment(1);
        dropped
    }

    /// Clear the table every `interval` until the returned task is aborted.
    ///
    /// # Panics
    ///
    /// Panics when called outside a Tokio runtime, or when `interval` is zero.
    pub fn spawn_sweeper(&self, interval: Duration) -> JoinHandle<()> {
        assert!(!interval.is_zero(), "sweep interval must be non-zero");
        let controller = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await; // Skip the first immediate tick
            loop {
                ticker.tick().await;
                let dropped = controller.clear();
                info!(dropped, "admission table swept");
            }
        })
    }
}

fn now_millis() -> i64 {
    let nanos = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
    i64::try_from(nanos).unwrap_or(i64::MAX)
}
