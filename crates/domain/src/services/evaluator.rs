//! Geofence containment evaluation.
//!
//! The evaluator turns one position sample plus the owning zone into a
//! verdict and the writes that verdict requires. It never touches storage:
//! committing [`Effects`] is the caller's job.

use chrono::{FixedOffset, Offset, Utc};
use serde::Serialize;

use crate::error::DomainError;
use crate::models::{AlarmRecord, PositionSample, Zone};
use crate::services::geo_math::distance_meters;
use crate::services::schedule::{is_active, time_of_day};

/// Result of checking one sample against one zone.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Verdict {
    pub inside: bool,
    pub schedule_active: bool,
    pub should_alarm: bool,
    pub distance_meters: f64,
}

/// A sample to append to a zone's location trail.
#[derive(Debug, Clone, PartialEq)]
pub struct TrailAppend {
    pub zone_id: String,
    pub sample: PositionSample,
}

/// Writes produced by an evaluation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Effects {
    pub trail_append: Option<TrailAppend>,
    pub alarm: Option<AlarmRecord>,
}

/// An evaluated sample.
#[derive(Debug, Clone, PartialEq)]
pub struct Assessment {
    pub zone_id: String,
    pub zone_name: String,
    pub verdict: Verdict,
    pub effects: Effects,
}

/// Why a sample was not evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The wristband has no zone, or its zone no longer exists.
    ZoneUnresolved,
}

/// Outcome of [`GeofenceEvaluator::evaluate`].
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluation {
    Skipped(SkipReason),
    Evaluated(Assessment),
}

/// Evaluates position samples against zones.
#[derive(Debug, Clone, Copy)]
pub struct GeofenceEvaluator {
    utc_offset: FixedOffset,
}

impl GeofenceEvaluator {
    /// Creates an evaluator that reads schedule windows at the given UTC offset.
    pub fn new(utc_offset: FixedOffset) -> Self {
        Self { utc_offset }
    }

    /// Creates an evaluator whose schedule windows are in UTC.
    pub fn utc() -> Self {
        Self::new(Utc.fix())
    }

    /// Evaluates `sample` against `zone`.
    ///
    /// An absent zone yields [`Evaluation::Skipped`]. A sample exactly on the
    /// radius counts as inside. Outside the active window nothing alarms.
    pub fn evaluate(
        &self,
        zone: Option<&Zone>,
        sample: &PositionSample,
    ) -> Result<Evaluation, DomainError> {
        let Some(zone) = zone else {
            return Ok(Evaluation::Skipped(SkipReason::ZoneUnresolved));
        };

        let distance = distance_meters(&zone.center, &sample.coordinate)?;
        let inside = distance <= zone.radius_meters;
        let schedule_active = is_active(
            &zone.active_window,
            time_of_day(sample.timestamp, self.utc_offset),
        );
        let should_alarm = schedule_active && !inside;

        let effects = if should_alarm {
            Effects {
                trail_append: Some(TrailAppend {
                    zone_id: zone.id.clone(),
                    sample: sample.clone(),
                }),
                alarm: Some(AlarmRecord::for_zone(zone, sample.timestamp)),
            }
        } else {
            Effects::default()
        };

        Ok(Evaluation::Evaluated(Assessment {
            zone_id: zone.id.clone(),
            zone_name: zone.name.clone(),
            verdict: Verdict {
                inside,
                schedule_active,
                should_alarm,
                distance_meters: distance,
            },
            effects,
        }))
    }
}

impl Default for GeofenceEvaluator {
    fn default() -> Self {
        Self::utc()
    }
}
