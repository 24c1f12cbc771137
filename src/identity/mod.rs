//! Issuance of label identifiers and tracking numbers.
//!
//! Uuids are drawn from the OS-backed generator behind `uuid`'s v4 support and
//! checked against a caller-supplied [`CollisionCheck`]. The retry budget is
//! small and fixed: a generator that keeps colliding is broken, so exhaustion
//! is reported as a hard failure.

use rand::Rng;
use thiserror::Error;
use tracing::{error, warn};
use uuid::Uuid;

use crate::cache::Cache;
use crate::domain::error::DomainError;
use crate::domain::tracking::{TRACKING_DIGIT_COUNT, TrackingNumberMetaData, TrackingPrefix};

/// Regenerations allowed after the first candidate collides.
pub const MAX_REGENERATIONS: usize = 3;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IssueError {
    #[error("no collision-free uuid after {attempts} attempts")]
    EntropyExhausted { attempts: usize },
    #[error("tracking numbers cannot be issued for the nil uuid")]
    NilUuid,
    #[error(transparent)]
    Validation(#[from] DomainError),
}

/// Answers whether a freshly generated uuid is already taken.
pub trait CollisionCheck {
    fn collides(&self, candidate: &Uuid) -> bool;
}

/// Accepts every candidate.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCollisionCheck;

impl CollisionCheck for NoCollisionCheck {
    fn collides(&self, _candidate: &Uuid) -> bool {
        false
    }
}

impl<F> CollisionCheck for F
where
    F: Fn(&Uuid) -> bool,
{
    fn collides(&self, candidate: &Uuid) -> bool {
        self(candidate)
    }
}

/// A uuid collides when any registered key, under any classification, uses it.
impl<V: Clone> CollisionCheck for Cache<Uuid, V> {
    fn collides(&self, candidate: &Uuid) -> bool {
        self.contains_raw_key(candidate)
    }
}

/// Mints label uuids and the tracking numbers paired with them.
#[derive(Debug, Clone, Default)]
pub struct IdentifierIssuer {
    prefix: TrackingPrefix,
}

impl IdentifierIssuer {
    pub fn new(prefix: TrackingPrefix) -> Self {
        Self { prefix }
    }

    pub fn prefix(&self) -> &TrackingPrefix {
        &self.prefix
    }

    /// Produce a uuid that `collision` reports as free.
    ///
    /// At most `1 + MAX_REGENERATIONS` candidates are checked.
    pub fn issue_uuid(&self, collision: &impl CollisionCheck) -> Result<Uuid, IssueError> {
        let attempts = MAX_REGENERATIONS + 1;
        for attempt in 1..=attempts {
            let candidate = Uuid::new_v4();
            if !collision.collides(&candidate) {
                return Ok(candidate);
            }
            warn!(attempt, %candidate, "generated uuid collided");
        }

        error!(attempts, "uuid issuance exhausted its retry budget");
        Err(IssueError::EntropyExhausted { attempts })
    }

    /// Mint a tracking number for `qr_uuid`: the prefix followed by
    /// [`TRACKING_DIGIT_COUNT`] random decimal digits.
    pub fn issue_tracking_number(
        &self,
        qr_uuid: Uuid,
    ) -> Result<TrackingNumberMetaData, IssueError> {
        if qr_uuid.is_nil() {
            return Err(IssueError::NilUuid);
        }

        let mut rng = rand::rng();
        let prefix = self.prefix.as_str();
        let mut tracking_number = String::with_capacity(prefix.len() + TRACKING_DIGIT_COUNT);
        tracking_number.push_str(prefix);
        for _ in 0..TRACKING_DIGIT_COUNT {
            let digit: u8 = rng.random_range(0..10);
            tracking_number.push(char::from(b'0' + digit));
        }

        Ok(TrackingNumberMetaData::with_prefix(
            prefix,
            tracking_number,
            qr_uuid,
        )?)
    }
}
