//! Cache key definitions.
//!
//! A [`CacheKey`] is the composite of a caller-supplied raw key and four
//! classification dimensions. Every dimension has an explicit `Unset` variant:
//! an omitted dimension is a value of its own and never matches anything else.

use std::fmt;
use std::hash::Hash;

use serde::Serialize;

/// Storage tier a cached entry belongs to. Only `Memory` is backed here; the
/// other tiers are carried for classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheType {
    #[default]
    Unset,
    Memory,
    Distributed,
    Disk,
    Hybrid,
    Database,
}

/// Logical bucket of cached data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheDomain {
    #[default]
    Unset,
    Scans,
    ScanErrors,
    Qr,
    Tracking,
    Delivery,
    User,
    Routes,
}

/// Producer of a cached entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheSource {
    #[default]
    Unset,
    AiScanner,
    QrGenerator,
    TrackingGenerator,
    DeliveryTracker,
    ScanErrorTracker,
}

/// Schema/behaviour version tag of a cached entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum CacheVersion {
    #[default]
    Unset,
    Alpha,
    Beta,
    Dev,
    V1_0,
    V1_1,
    V1_2,
    V1_3,
    V1_4,
    V1_5,
    Experimental,
}

impl CacheType {
    pub fn as_str(self) -> &'static str {
        match self {
            CacheType::Unset => "unset",
            CacheType::Memory => "memory",
            CacheType::Distributed => "distributed",
            CacheType::Disk => "disk",
            CacheType::Hybrid => "hybrid",
            CacheType::Database => "database",
        }
    }
}

impl CacheDomain {
    pub fn as_str(self) -> &'static str {
        match self {
            CacheDomain::Unset => "unset",
            CacheDomain::Scans => "scans",
            CacheDomain::ScanErrors => "scan_errors",
            CacheDomain::Qr => "qr",
            CacheDomain::Tracking => "tracking",
            CacheDomain::Delivery => "delivery",
            CacheDomain::User => "user",
            CacheDomain::Routes => "routes",
        }
    }
}

impl CacheSource {
    pub fn as_str(self) -> &'static str {
        match self {
            CacheSource::Unset => "unset",
            CacheSource::AiScanner => "ai_scanner",
            CacheSource::QrGenerator => "qr_generator",
            CacheSource::TrackingGenerator => "tracking_generator",
            CacheSource::DeliveryTracker => "delivery_tracker",
            CacheSource::ScanErrorTracker => "scan_error_tracker",
        }
    }
}

impl CacheVersion {
    pub fn as_str(self) -> &'static str {
        match self {
            CacheVersion::Unset => "unset",
            CacheVersion::Alpha => "alpha",
            CacheVersion::Beta => "beta",
            CacheVersion::Dev => "dev",
            CacheVersion::V1_0 => "1.0",
            CacheVersion::V1_1 => "1.1",
            CacheVersion::V1_2 => "1.2",
            CacheVersion::V1_3 => "1.3",
            CacheVersion::V1_4 => "1.4",
            CacheVersion::V1_5 => "1.5",
            CacheVersion::Experimental => "experimental",
        }
    }
}

/// Five-dimension composite cache identity.
///
/// Equality and hashing cover all five dimensions.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey<K> {
    raw: K,
    cache_type: CacheType,
    domain: CacheDomain,
    source: CacheSource,
    version: CacheVersion,
}

impl<K> CacheKey<K> {
    /// Key with every classification dimension left unset.
    pub fn new(raw: K) -> Self {
        Self {
            raw,
            cache_type: CacheType::Unset,
            domain: CacheDomain::Unset,
            source: CacheSource::Unset,
            version: CacheVersion::Unset,
        }
    }

    /// Build a key from optional dimensions; `None` maps to the `Unset` variant.
    pub fn from_parts(
        raw: K,
        cache_type: Option<CacheType>,
        domain: Option<CacheDomain>,
        source: Option<CacheSource>,
        version: Option<CacheVersion>,
    ) -> Self {
        Self {
            raw,
            cache_type: cache_type.unwrap_or_default(),
            domain: domain.unwrap_or_default(),
            source: source.unwrap_or_default(),
            version: version.unwrap_or_default(),
        }
    }

    pub fn with_type(self, cache_type: CacheType) -> Self {
        Self { cache_type, ..self }
    }

    pub fn with_domain(self, domain: CacheDomain) -> Self {
        Self { domain, ..self }
    }

    pub fn with_source(self, source: CacheSource) -> Self {
        Self { source, ..self }
    }

    pub fn with_version(self, version: CacheVersion) -> Self {
        Self { version, ..self }
    }

    pub fn raw(&self) -> &K {
        &self.raw
    }

    pub fn cache_type(&self) -> CacheType {
        self.cache_type
    }

    pub fn domain(&self) -> CacheDomain {
        self.domain
    }

    pub fn source(&self) -> CacheSource {
        self.source
    }

    pub fn version(&self) -> CacheVersion {
        self.version
    }
}

impl<K: fmt::Debug> fmt::Display for CacheKey<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?}@{}/{}/{}/{}",
            self.raw,
            self.cache_type.as_str(),
            self.domain.as_str(),
            self.source.as_str(),
            self.version.as_str()
        )
    }
}
