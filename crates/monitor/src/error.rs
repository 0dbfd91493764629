//! Monitor error taxonomy.
//!
//! None of these stop the monitor. They are absorbed per wristband and
//! reported in the cycle summary.

use domain::DomainError;
use persistence::StoreError;
use thiserror::Error;

use crate::provider::LocationError;

#[derive(Debug, Error)]
pub enum MonitorError {
    /// The wristband has no zone, or its zone was deleted.
    #[error("Wristband '{wristband_id}' has no resolvable zone (zone id: {zone_id:?})")]
    ZoneUnresolved {
        wristband_id: String,
        zone_id: Option<String>,
    },

    #[error("Location unavailable for wristband '{wristband_id}': {source}")]
    LocationUnavailable {
        wristband_id: String,
        #[source]
        source: LocationError,
    },

    #[error("Storage failure: {0}")]
    StorageFailure(#[from] StoreError),

    /// The provider reported a position outside the valid coordinate range.
    #[error("Invalid position sample: {0}")]
    InvalidCoordinate(#[from] DomainError),
}

impl MonitorError {
    /// Metric label for the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            MonitorError::ZoneUnresolved { .. } => "zone_unresolved",
            MonitorError::LocationUnavailable { .. } => "location_unavailable",
            MonitorError::StorageFailure(_) => "storage_failure",
            MonitorError::InvalidCoordinate(_) => "invalid_coordinate",
        }
    }
}
