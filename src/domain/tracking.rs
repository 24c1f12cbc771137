//! Tracking numbers and their pairing with QR label identifiers.
//!
//! A tracking number is a fixed prefix followed by exactly
//! [`TRACKING_DIGIT_COUNT`] ASCII decimal digits. The pairing is validated when
//! it is built, so a [`TrackingNumberMetaData`] in hand is always well formed.

use std::fmt;

use serde::Serialize;
use uuid::Uuid;

use super::error::DomainError;

/// Prefix stamped on every tracking number minted by this service.
pub const DEFAULT_TRACKING_PREFIX: &str = "TAVALL-";

/// Number of random digits following the prefix.
pub const TRACKING_DIGIT_COUNT: usize = 14;

/// Validated tracking-number prefix: not blank and free of ASCII digits, so the
/// digit suffix of a tracking number is never ambiguous.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct TrackingPrefix(String);

impl TrackingPrefix {
    pub fn parse(raw: impl Into<String>) -> Result<Self, DomainError> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(DomainError::validation("tracking prefix must not be blank"));
        }
        if raw.bytes().any(|b| b.is_ascii_digit()) {
            return Err(DomainError::validation(format!(
                "tracking prefix `{raw}` must not contain digits"
            )));
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TrackingPrefix {
    fn default() -> Self {
        Self(DEFAULT_TRACKING_PREFIX.to_string())
    }
}

impl fmt::Display for TrackingPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Immutable pairing of a tracking number with the QR label it was issued for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct TrackingNumberMetaData {
    tracking_number: String,
    qr_uuid: Uuid,
}

impl TrackingNumberMetaData {
    /// Validate and build a pairing that must carry [`DEFAULT_TRACKING_PREFIX`].
    pub fn new(tracking_number: impl Into<String>, qr_uuid: Uuid) -> Result<Self, DomainError> {
        Self::with_prefix(DEFAULT_TRACKING_PREFIX, tracking_number, qr_uuid)
    }

    /// Validate and build a pairing against an explicit prefix.
    pub fn with_prefix(
        prefix: &str,
        tracking_number: impl Into<String>,
        qr_uuid: Uuid,
    ) -> Result<Self, DomainError> {
        let tracking_number = tracking_number.into();

        if qr_uuid.is_nil() {
            return Err(DomainError::validation("QR uuid cannot be nil"));
        }
        if tracking_number.trim().is_empty() {
            return Err(DomainError::validation(
                "tracking number cannot be empty or blank",
            ));
        }
        if !is_well_formed(prefix, &tracking_number) {
            return Err(DomainError::validation(format!(
                "tracking number `{tracking_number}` must be `{prefix}` followed by {TRACKING_DIGIT_COUNT} digits"
            )));
        }

        Ok(Self {
            tracking_number,
            qr_uuid,
        })
    }

    pub fn tracking_number(&self) -> &str {
        &self.tracking_number
    }

    pub fn qr_uuid(&self) -> Uuid {
        self.qr_uuid
    }
}

/// Returns true when `candidate` is `prefix` followed by exactly
/// [`TRACKING_DIGIT_COUNT`] ASCII digits.
pub fn is_well_formed(prefix: &str, candidate: &str) -> bool {
    if prefix.trim().is_empty() {
        return false;
    }
    match candidate.strip_prefix(prefix) {
        Some(digits) => {
            digits.len() == TRACKING_DIGIT_COUNT && digits.bytes().all(|b| b.is_ascii_digit())
        }
        None => false,
    }
}
