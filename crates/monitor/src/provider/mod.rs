//! Location provider contract.

mod replay;

pub use replay::{ReplayError, ReplayLocationProvider};

use async_trait::async_trait;
use domain::models::PositionSample;
use thiserror::Error;

/// Why a position could not be obtained. Both cases are retryable.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LocationError {
    #[error("location permission denied")]
    PermissionDenied,

    #[error("location unavailable: {0}")]
    Unavailable(String),
}

/// Source of current positions for tracked wristbands.
#[async_trait]
pub trait LocationProvider: Send + Sync {
    /// Polls the current position of `wristband_id`.
    async fn current_position(&self, wristband_id: &str) -> Result<PositionSample, LocationError>;
}
