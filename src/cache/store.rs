//! Concurrent multi-value cache keyed by [`CacheKey`].
//!
//! Each key maps to an ordered bucket of [`CacheValue`]s. A key must be
//! registered before values can be appended to it; the bucket is dropped again
//! as soon as the last value is removed. All operations are safe to call from
//! many threads at once: appends to the same key are serialized on the shard
//! lock and none are lost.

use std::fmt::Debug;
use std::hash::Hash;
use std::time::Duration;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use thiserror::Error;
use time::OffsetDateTime;
use tracing::{debug, warn};

use super::keys::{CacheDomain, CacheKey, CacheType};
use super::stats::CacheStats;

const METRIC_CACHE_REJECTED_TOTAL: &str = "courier_intake_cache_rejected_total";
const SOURCE: &str = "cache::store";

/// Errors surfaced by [`Cache`] operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CacheError {
    #[error("cache key `{key}` has not been registered")]
    Unregistered { key: String },
}

// ============================================================================
// Values
// ============================================================================

/// A cached payload stamped with its creation instant.
///
/// Two values are equal when their payloads are equal; the timestamp is
/// metadata and does not take part in comparisons.
#[derive(Debug, Clone)]
pub struct CacheValue<V> {
    payload: V,
    created_at: OffsetDateTime,
}

impl<V> CacheValue<V> {
    pub fn new(payload: V) -> Self {
        Self::at(payload, OffsetDateTime::now_utc())
    }

    pub fn at(payload: V, created_at: OffsetDateTime) -> Self {
        Self {
            payload,
            created_at,
        }
    }

    pub fn payload(&self) -> &V {
        &self.payload
    }

    pub fn into_payload(self) -> V {
        self.payload
    }

    pub fn created_at(&self) -> OffsetDateTime {
        self.created_at
    }

    /// Whether the value is older than `max_age` as of `now`.
    pub fn is_expired(&self, now: OffsetDateTime, max_age: Duration) -> bool {
        now - self.created_at > max_age
    }
}

impl<V: PartialEq> PartialEq for CacheValue<V> {
    fn eq(&self, other: &Self) -> bool {
        self.payload == other.payload
    }
}

impl<V: Eq> Eq for CacheValue<V> {}

// ============================================================================
// Cache
// ============================================================================

/// Thread-safe keyed store of value buckets.
pub struct Cache<K, V> {
    entries: DashMap<CacheKey<K>, Vec<CacheValue<V>>>,
}

impl<K, V> Default for Cache<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }
}

impl<K, V> Cache<K, V>
where
    K: Eq + Hash + Clone + Debug,
    V: Clone,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Ensure an empty bucket exists for `key`.
    ///
    /// Returns `true` when the key was newly registered. Registering an existing
    /// key leaves its bucket untouched.
    pub fn register(&self, key: CacheKey<K>) -> bool {
        match self.entries.entry(key) {
            Entry::Vacant(vacant) => {
                debug!(target_module = SOURCE, key = %vacant.key(), "cache key registered");
                vacant.insert(Vec::new());
                true
            }
            Entry::Occupied(_) => false,
        }
    }

    /// Append `value` to the bucket of a registered key.
    ///
    /// Returns the bucket length after the append.
    pub fn add(&self, key: &CacheKey<K>, value: CacheValue<V>) -> Result<usize, CacheError> {
        match self.entries.get_mut(key) {
            Some(mut bucket) => {
                bucket.push(value);
                Ok(bucket.len())
            }
            None => {
                warn!(target_module = SOURCE, key = %key, "add rejected for unregistered key");
                Err(Self::rejected("add", key))
            }
        }
    }

    /// Delete `key` and its whole bucket, returning the removed values.
    pub fn remove(&self, key: &CacheKey<K>) -> Result<Vec<CacheValue<V>>, CacheError> {
        match self.entries.remove(key) {
            Some((_, bucket)) => Ok(bucket),
            None => {
                warn!(target_module = SOURCE, key = %key, "remove rejected for unregistered key");
                Err(Self::rejected("remove", key))
            }
        }
    }

    fn rejected(operation: &'static str, key: &CacheKey<K>) -> CacheError {
        metrics::counter!(METRIC_CACHE_REJECTED_TOTAL, "operation" => operation).increment(1);
        CacheError::Unregistered {
            key: key.to_string(),
        }
    }

    /// Remove the first value equal to `value` from whichever bucket holds it.
    ///
    /// A bucket left empty by the removal is deleted along with its key.
    pub fn remove_by_value(&self, value: &CacheValue<V>) -> bool
    where
        V: PartialEq,
    {
        let mut removed = false;
        let mut emptied = None;

        for mut entry in self.entries.iter_mut() {
            if let Some(position) = entry.value().iter().position(|candidate| candidate == value) {
                entry.value_mut().remove(position);
                removed = true;
                if entry.value().is_empty() {
                    emptied = Some(entry.key().clone());
                }
                break;
            }
        }

        // Shard guards are gone by now; only drop the key if still empty.
        if let Some(key) = emptied {
            self.entries.remove_if(&key, |_, bucket| bucket.is_empty());
        }

        removed
    }

    /// Snapshot every bucket whose key is classified under `domain`.
    pub fn find_by_domain(&self, domain: CacheDomain) -> Vec<Vec<CacheValue<V>>> {
        self.entries
            .iter()
            .filter(|entry| entry.key().domain() == domain)
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Snapshot every bucket whose key is classified under `cache_type`.
    pub fn find_by_type(&self, cache_type: CacheType) -> Vec<Vec<CacheValue<V>>> {
        self.entries
            .iter()
            .filter(|entry| entry.key().cache_type() == cache_type)
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Copy of the bucket for `key`, oldest first. Unknown keys yield an empty list.
    pub fn bucket(&self, key: &CacheKey<K>) -> Vec<CacheValue<V>> {
        self.entries
            .get(key)
            .map(|bucket| bucket.clone())
            .unwrap_or_default()
    }

    /// Up to `limit` payloads for `key`, newest first. A limit of zero returns all.
    pub fn recent(&self, key: &CacheKey<K>, limit: usize) -> Vec<V> {
        let Some(bucket) = self.entries.get(key) else {
            return Vec::new();
        };
        let take = if limit == 0 { bucket.len() } else { limit };
        bucket
            .iter()
            .rev()
            .take(take)
            .map(|value| value.payload().clone())
            .collect()
    }

    pub fn contains_key(&self, key: &CacheKey<K>) -> bool {
        self.entries.contains_key(key)
    }

    /// Whether the bucket for `key` holds a value with `payload`.
    pub fn contains_payload(&self, key: &CacheKey<K>, payload: &V) -> bool
    where
        V: PartialEq,
    {
        self.entries
            .get(key)
            .is_some_and(|bucket| bucket.iter().any(|value| value.payload() == payload))
    }

    /// Whether any registered key, under any classification, uses `raw`.
    pub fn contains_raw_key(&self, raw: &K) -> bool {
        self.entries.iter().any(|entry| entry.key().raw() == raw)
    }

    /// Number of registered keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of values across every bucket.
    pub fn value_count(&self) -> usize {
        self.entries.iter().map(|entry| entry.value().len()).sum()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Occupancy as of now. Values older than `max_age` count as expired; with
    /// no `max_age` every value is valid.
    pub fn stats(&self, max_age: Option<Duration>) -> CacheStats {
        self.stats_at(OffsetDateTime::now_utc(), max_age)
    }

    pub fn stats_at(&self, now: OffsetDateTime, max_age: Option<Duration>) -> CacheStats {
        let mut total = 0;
        let mut expired = 0;

        for entry in self.entries.iter() {
            total += entry.value().len();
            if let Some(max_age) = max_age {
                expired += entry
                    .value()
                    .iter()
                    .filter(|value| value.is_expired(now, max_age))
                    .count();
            }
        }

        CacheStats::default()
            .with_total_entries(total)
            .with_valid_entries(total - expired)
            .with_expired_entries(expired)
    }
}
