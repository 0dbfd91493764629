//! Alarm history records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::Zone;

/// An alarm raised because a wristband was outside its zone during the active window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlarmRecord {
    pub zone_name: String,
    pub timestamp: DateTime<Utc>,
    /// Zone the alarm was raised for. Absent on records written by older app versions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone_id: Option<String>,
    /// Start of the exit episode the alarm belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub episode_start: Option<DateTime<Utc>>,
}

impl AlarmRecord {
    /// Creates a record carrying only the fields the alarm history screen shows.
    pub fn new(zone_name: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            zone_name: zone_name.into(),
            timestamp,
            zone_id: None,
            episode_start: None,
        }
    }

    /// Creates a record for the given zone.
    pub fn for_zone(zone: &Zone, timestamp: DateTime<Utc>) -> Self {
        Self {
            zone_name: zone.name.clone(),
            timestamp,
            zone_id: Some(zone.id.clone()),
            episode_start: None,
        }
    }

    pub fn with_episode_start(mut self, episode_start: DateTime<Utc>) -> Self {
        self.episode_start = Some(episode_start);
        self
    }
}
