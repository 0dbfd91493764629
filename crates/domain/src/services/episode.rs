//! Containment transitions per wristband.
//!
//! An episode is an uninterrupted span during which a wristband stays
//! outside its zone while the zone's window is active.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::services::evaluator::Verdict;

/// Change in a wristband's episode state caused by one verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The wristband just left its zone during the active window.
    Started { started_at: DateTime<Utc> },
    /// The wristband is still outside.
    Continued { started_at: DateTime<Utc> },
    /// The wristband came back inside, or the window closed.
    Ended {
        started_at: DateTime<Utc>,
        ended_at: DateTime<Utc>,
    },
    /// No episode before or after.
    Idle,
}

impl Transition {
    /// Start of the episode that is open after this transition.
    pub fn open_episode_start(&self) -> Option<DateTime<Utc>> {
        match self {
            Transition::Started { started_at } | Transition::Continued { started_at } => {
                Some(*started_at)
            }
            Transition::Ended { .. } | Transition::Idle => None,
        }
    }
}

#[derive(Debug, Clone)]
struct OpenEpisode {
    zone_id: String,
    started_at: DateTime<Utc>,
}

/// Tracks open episodes keyed by wristband id.
#[derive(Debug, Default)]
pub struct EpisodeTracker {
    open: HashMap<String, OpenEpisode>,
}

impl EpisodeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one verdict for `wristband_id` in `zone_id`, observed at `at`.
    ///
    /// Reassigning a wristband to another zone closes its previous episode.
    pub fn observe(
        &mut self,
        wristband_id: &str,
        zone_id: &str,
        verdict: &Verdict,
        at: DateTime<Utc>,
    ) -> Transition {
        if self
            .open
            .get(wristband_id)
            .is_some_and(|episode| episode.zone_id != zone_id)
        {
            if let Some(stale) = self.open.remove(wristband_id) {
                debug!(
                    wristband_id = %wristband_id,
                    previous_zone_id = %stale.zone_id,
                    zone_id = %zone_id,
                    "Wristband changed zone, closing previous episode"
                );
            }
        }

        match (verdict.should_alarm, self.open.get(wristband_id)) {
            (true, Some(episode)) => Transition::Continued {
                started_at: episode.started_at,
            },
            (true, None) => {
                self.open.insert(
                    wristband_id.to_string(),
                    OpenEpisode {
                        zone_id: zone_id.to_string(),
                        started_at: at,
                    },
                );
                Transition::Started { started_at: at }
            }
            (false, Some(_)) => match self.open.remove(wristband_id) {
                Some(episode) => Transition::Ended {
                    started_at: episode.started_at,
                    ended_at: at,
                },
                None => Transition::Idle,
            },
            (false, None) => Transition::Idle,
        }
    }

    /// Start of the open episode for `wristband_id`, if any.
    pub fn open_episode(&self, wristband_id: &str) -> Option<DateTime<Utc>> {
        self.open.get(wristband_id).map(|e| e.started_at)
    }

    /// Drops state for wristbands that are no longer monitored.
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&str) -> bool,
    {
        self.open.retain(|wristband_id, _| keep(wristband_id));
    }

    #[cfg(test)]
    pub fn open_count(&self) -> usize {
        self.open.len()
    }
}
