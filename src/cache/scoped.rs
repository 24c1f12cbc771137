//! Fixed-classification views over a shared [`Cache`].
//!
//! A [`ScopedCache`] pins the type, domain, source and version dimensions so
//! callers only ever supply the raw key.

use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;

use super::keys::{CacheDomain, CacheKey, CacheSource, CacheType, CacheVersion};
use super::store::{Cache, CacheError, CacheValue};

/// The four classification dimensions shared by every key of one producer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheProfile {
    pub cache_type: CacheType,
    pub domain: CacheDomain,
    pub source: CacheSource,
    pub version: CacheVersion,
}

impl CacheProfile {
    /// Completed scan results written by the vision analyzer.
    pub const SCANS: CacheProfile = CacheProfile::new(
        CacheType::Memory,
        CacheDomain::Scans,
        CacheSource::AiScanner,
        CacheVersion::V1_0,
    );

    /// Failed scan cycles, when error recording is enabled.
    pub const SCAN_ERRORS: CacheProfile = CacheProfile::new(
        CacheType::Memory,
        CacheDomain::ScanErrors,
        CacheSource::ScanErrorTracker,
        CacheVersion::V1_0,
    );

    /// Label identifiers handed out by the identifier issuer.
    pub const QR_CODES: CacheProfile = CacheProfile::new(
        CacheType::Memory,
        CacheDomain::Qr,
        CacheSource::QrGenerator,
        CacheVersion::V1_0,
    );

    pub const fn new(
        cache_type: CacheType,
        domain: CacheDomain,
        source: CacheSource,
        version: CacheVersion,
    ) -> Self {
        Self {
            cache_type,
            domain,
            source,
            version,
        }
    }

    pub fn key<K>(&self, raw: K) -> CacheKey<K> {
        CacheKey::new(raw)
            .with_type(self.cache_type)
            .with_domain(self.domain)
            .with_source(self.source)
            .with_version(self.version)
    }
}

/// A [`Cache`] handle bound to one [`CacheProfile`].
pub struct ScopedCache<K, V> {
    profile: CacheProfile,
    cache: Arc<Cache<K, V>>,
}

impl<K, V> Clone for ScopedCache<K, V> {
    fn clone(&self) -> Self {
        Self {
            profile: self.profile,
            cache: Arc::clone(&self.cache),
        }
    }
}

impl<K, V> ScopedCache<K, V>
where
    K: Eq + Hash + Clone + Debug,
    V: Clone,
{
    pub fn new(profile: CacheProfile, cache: Arc<Cache<K, V>>) -> Self {
        Self { profile, cache }
    }

    pub fn profile(&self) -> CacheProfile {
        self.profile
    }

    pub fn cache(&self) -> &Arc<Cache<K, V>> {
        &self.cache
    }

    /// Register the key for `raw` if needed, then append `payload`.
    pub fn record(&self, raw: K, payload: V) -> Result<usize, CacheError> {
        let key = self.profile.key(raw);
        self.cache.register(key.clone());
        self.cache.add(&key, CacheValue::new(payload))
    }

    /// Up to `limit` payloads for `raw`, newest first. Zero returns all.
    pub fn recent(&self, raw: K, limit: usize) -> Vec<V> {
        self.cache.recent(&self.profile.key(raw), limit)
    }

    pub fn latest(&self, raw: K) -> Option<V> {
        self.recent(raw, 1).into_iter().next()
    }

    /// Drop the bucket for `raw`, returning its payloads oldest first.
    pub fn remove(&self, raw: K) -> Result<Vec<V>, CacheError> {
        let bucket = self.cache.remove(&self.profile.key(raw))?;
        Ok(bucket.into_iter().map(CacheValue::into_payload).collect())
    }

    pub fn contains(&self, raw: K) -> bool {
        self.cache.contains_key(&self.profile.key(raw))
    }

    /// Snapshot of every bucket under this profile's domain.
    pub fn all(&self) -> Vec<Vec<CacheValue<V>>> {
        self.cache.find_by_domain(self.profile.domain)
    }
}
