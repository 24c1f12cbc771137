//! Point-in-time cache statistics.

use std::fmt;

use serde::Serialize;

/// Immutable snapshot of cache occupancy.
///
/// Updates produce a new value through the `with_*` constructors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    total_entries: usize,
    valid_entries: usize,
    expired_entries: usize,
}

impl CacheStats {
    pub fn new(total_entries: usize, valid_entries: usize, expired_entries: usize) -> Self {
        Self {
            total_entries,
            valid_entries,
            expired_entries,
        }
    }

    pub fn total_entries(&self) -> usize {
        self.total_entries
    }

    pub fn valid_entries(&self) -> usize {
        self.valid_entries
    }

    pub fn expired_entries(&self) -> usize {
        self.expired_entries
    }

    pub fn with_total_entries(self, total_entries: usize) -> Self {
        Self {
            total_entries,
            ..self
        }
    }

    pub fn with_valid_entries(self, valid_entries: usize) -> Self {
        Self {
            valid_entries,
            ..self
        }
    }

    pub fn with_expired_entries(self, expired_entries: usize) -> Self {
        Self {
            expired_entries,
            ..self
        }
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CacheStats{{total={}, valid={}, expired={}}}",
            self.total_entries, self.valid_entries, self.expired_entries
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructor_stores_every_field() {
        let stats = CacheStats::new(7, 5, 2);
        assert_eq!(stats.total_entries(), 7);
        assert_eq!(stats.valid_entries(), 5);
        assert_eq!(stats.expired_entries(), 2);
    }

    #[test]
    fn with_constructors_replace_one_field() {
        let base = CacheStats::new(1, 1, 0);
        let updated = base.with_total_entries(9);

        assert_eq!(base.total_entries(), 1);
        assert_eq!(updated, CacheStats::new(9, 1, 0));
        assert_eq!(
            updated.with_valid_entries(4).with_expired_entries(5),
            CacheStats::new(9, 4, 5)
        );
    }

    #[test]
    fn display_format() {
        assert_eq!(
            CacheStats::new(3, 2, 1).to_string(),
            "CacheStats{total=3, valid=2, expired=1}"
        );
    }
}
