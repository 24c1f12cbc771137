//! Application-level error reporting for the binary.

pub mod error;
