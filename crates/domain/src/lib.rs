//! Domain layer for the iFence geofence core.
//!
//! This crate contains:
//! - Domain models (Zone, Wristband, PositionSample, AlarmRecord)
//! - Pure evaluation services (distance, schedule windows, containment, episodes)
//! - Domain error types

pub mod error;
pub mod models;
pub mod services;

pub use error::DomainError;
