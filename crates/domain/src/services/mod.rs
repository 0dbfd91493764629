//! Domain services for the geofence core.
//!
//! Everything here is pure: no storage, no clocks, no I/O. Side effects are
//! returned to the caller as values.

pub mod alarm_dedup;
pub mod episode;
pub mod evaluator;
pub mod geo_math;
pub mod schedule;

pub use alarm_dedup::{AlarmDedupPolicy, DedupKey};
pub use episode::{EpisodeTracker, Transition};
pub use evaluator::{
    Assessment, Effects, Evaluation, GeofenceEvaluator, SkipReason, TrailAppend, Verdict,
};
pub use geo_math::{distance_meters, EARTH_RADIUS_METERS};
pub use schedule::{is_active, time_of_day};
