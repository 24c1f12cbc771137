//! Cache configuration.

use std::time::Duration;

use serde::Deserialize;

const DEFAULT_STATS_MAX_AGE_SECS: u64 = 300;

/// Cache tuning resolved from the `[cache]` settings section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Age (seconds) past which a value counts as expired in statistics.
    /// Zero disables expiry accounting.
    pub stats_max_age_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            stats_max_age_secs: DEFAULT_STATS_MAX_AGE_SECS,
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            stats_max_age_secs: settings.stats_max_age_secs,
        }
    }
}

impl CacheConfig {
    pub fn stats_max_age(&self) -> Option<Duration> {
        (self.stats_max_age_secs > 0).then(|| Duration::from_secs(self.stats_max_age_secs))
    }
}
