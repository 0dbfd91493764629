//! Monitor metrics.
//!
//! Records the following metrics:
//! - `geofence_evaluations_total`: Counter
//! - `geofence_alarms_total`: Counter
//! - `location_failures_total`: Counter with label (policy)
//! - `monitor_cycle_failures_total`: Counter with label (kind)
//! - `monitor_cycle_duration_seconds`: Histogram

use metrics::{counter, histogram};

pub fn record_evaluation(alarmed: bool) {
    counter!("geofence_evaluations_total").increment(1);
    if alarmed {
        counter!("geofence_alarms_total").increment(1);
    }
}

pub fn record_location_failure(policy: &'static str) {
    counter!("location_failures_total", "policy" => policy).increment(1);
}

pub fn record_unit_failure(kind: &'static str) {
    counter!("monitor_cycle_failures_total", "kind" => kind).increment(1);
}

pub fn record_cycle_duration(duration_secs: f64) {
    histogram!("monitor_cycle_duration_seconds").record(duration_secs);
}
