//! Alarm history deduplication policies.
//!
//! Duplicates are accepted when alarms are recorded and filtered out when the
//! history is read back. The policy decides what counts as a duplicate.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::AlarmRecord;

/// How the alarm history collapses repeated alarms.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlarmDedupPolicy {
    /// Keep only the first alarm ever recorded for each zone name.
    ///
    /// This is how the alarm history screen has always behaved. Zone names
    /// are not unique, and a zone keeps a single entry forever, so this is
    /// most likely not the intended semantics. It stays the default so
    /// existing histories read back the same way.
    #[default]
    ZoneName,
    /// Keep one alarm per exit episode, keyed by `(zone id, episode start)`.
    Episode,
}

/// Identity of an alarm under a policy.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DedupKey {
    ZoneName(String),
    Episode {
        zone_id: String,
        episode_start: DateTime<Utc>,
    },
    /// A record that carries no episode information stands alone.
    Record {
        zone_name: String,
        timestamp: DateTime<Utc>,
    },
}

impl AlarmDedupPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ZoneName => "zone_name",
            Self::Episode => "episode",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "zone_name" => Some(Self::ZoneName),
            "episode" => Some(Self::Episode),
            _ => None,
        }
    }

    pub fn dedup_key(&self, record: &AlarmRecord) -> DedupKey {
        match self {
            Self::ZoneName => DedupKey::ZoneName(record.zone_name.clone()),
            Self::Episode => match (&record.zone_id, record.episode_start) {
                (Some(zone_id), Some(episode_start)) => DedupKey::Episode {
                    zone_id: zone_id.clone(),
                    episode_start,
                },
                _ => DedupKey::Record {
                    zone_name: record.zone_name.clone(),
                    timestamp: record.timestamp,
                },
            },
        }
    }

    /// Keeps the first record for each key, preserving insertion order.
    pub fn unique<I>(&self, records: I) -> Vec<AlarmRecord>
    where
        I: IntoIterator<Item = AlarmRecord>,
    {
        let mut seen = HashSet::new();
        records
            .into_iter()
            .filter(|record| seen.insert(self.dedup_key(record)))
            .collect()
    }
}

impl std::fmt::Display for AlarmDedupPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
