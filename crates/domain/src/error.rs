//! Domain error types.

use shared::time::TimeOfDayError;
use thiserror::Error;
use validator::ValidationError;

/// Errors raised by domain constructors and pure computations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DomainError {
    #[error("Invalid coordinate ({latitude}, {longitude}): {reason}")]
    InvalidCoordinate {
        latitude: f64,
        longitude: f64,
        reason: String,
    },

    #[error("Invalid zone '{zone_id}': {reason}")]
    InvalidZone { zone_id: String, reason: String },

    #[error(transparent)]
    InvalidTimeOfDay(#[from] TimeOfDayError),
}

/// Extracts the human-readable message of a validation failure.
pub(crate) fn validation_reason(err: &ValidationError) -> String {
    err.message
        .as_ref()
        .map(|m| m.to_string())
        .unwrap_or_else(|| err.code.to_string())
}
