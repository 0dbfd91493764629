//! Trail entry entity (stored under `localizacoes_<zoneId>`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use domain::models::PositionSample;

use super::number_or_string;

/// Stored location trail entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrailEntryEntity {
    #[serde(deserialize_with = "number_or_string")]
    pub latitude: f64,
    #[serde(deserialize_with = "number_or_string")]
    pub longitude: f64,
    pub timestamp: DateTime<Utc>,
}

impl From<TrailEntryEntity> for PositionSample {
    fn from(entity: TrailEntryEntity) -> Self {
        PositionSample::new(entity.latitude, entity.longitude, entity.timestamp)
    }
}

impl From<&PositionSample> for TrailEntryEntity {
    fn from(sample: &PositionSample) -> Self {
        Self {
            latitude: sample.coordinate.latitude,
            longitude: sample.coordinate.longitude,
            timestamp: sample.timestamp,
        }
    }
}
