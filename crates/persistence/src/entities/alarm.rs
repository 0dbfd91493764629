//! Alarm entity (stored under `historico_alarmes`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use domain::models::AlarmRecord;

/// Stored alarm record.
///
/// The app only reads `nomeCerca` and `timestamp`; the zone id and episode
/// start are extra fields written by the monitor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlarmEntity {
    #[serde(rename = "nomeCerca")]
    pub zone_name: String,

    pub timestamp: DateTime<Utc>,

    #[serde(rename = "cercaId", default, skip_serializing_if = "Option::is_none")]
    pub zone_id: Option<String>,

    #[serde(
        rename = "inicioEpisodio",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub episode_start: Option<DateTime<Utc>>,
}

impl From<AlarmEntity> for AlarmRecord {
    fn from(entity: AlarmEntity) -> Self {
        Self {
            zone_name: entity.zone_name,
            timestamp: entity.timestamp,
            zone_id: entity.zone_id,
            episode_start: entity.episode_start,
        }
    }
}

impl From<&AlarmRecord> for AlarmEntity {
    fn from(record: &AlarmRecord) -> Self {
        Self {
            zone_name: record.zone_name.clone(),
            timestamp: record.timestamp,
            zone_id: record.zone_id.clone(),
            episode_start: record.episode_start,
        }
    }
}
