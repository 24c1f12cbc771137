//! In-process classification cache.
//!
//! Values are grouped into buckets addressed by a five-part [`CacheKey`]:
//! the caller's raw key plus type, domain, source and version. Keys are
//! registered before use, and a bucket disappears once its last value is
//! removed.
//!
//! ```toml
//! [cache]
//! stats_max_age_secs = 300
//! ```

mod config;
mod keys;
mod scoped;
mod stats;
mod store;

pub use config::CacheConfig;
pub use keys::{CacheDomain, CacheKey, CacheSource, CacheType, CacheVersion};
pub use scoped::{CacheProfile, ScopedCache};
pub use stats::CacheStats;
pub use store::{Cache, CacheError, CacheValue};
