//! Scan-intake coordination core for a courier service.
//!
//! The crate sits between inbound camera frames and the rest of the system:
//!
//! - [`cache`]: process-wide bucketed cache keyed by a five-part identity.
//! - [`admission`]: per-caller cooldown gate in front of vision calls.
//! - [`identity`]: collision-checked uuid and tracking-number issuance.
//! - [`intake`]: the frame state machine and its collaborators.
//!
//! Every shared service is constructed explicitly and passed by `Arc` to its
//! consumers; there is no global instance.

pub mod admission;
pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod identity;
pub mod infra;
pub mod intake;
