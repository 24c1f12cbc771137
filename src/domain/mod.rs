//! Domain layer types and invariants.

pub mod error;
pub mod scan;
pub mod tracking;
pub mod types;
