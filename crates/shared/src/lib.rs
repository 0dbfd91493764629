//! Shared utilities for the iFence geofence core.
//!
//! This crate provides leaf functionality used by the other crates:
//! - Coordinate and radius validation
//! - Wall-clock time-of-day parsing and formatting

pub mod time;
pub mod validation;
