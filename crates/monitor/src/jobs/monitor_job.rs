//! The periodic geofence monitoring job.

use std::sync::Arc;

use tokio::time::Instant;
use tracing::warn;

use super::scheduler::{Job, JobFrequency};
use crate::monitor::Monitor;

/// Runs one [`Monitor`] cycle per tick.
pub struct GeofenceMonitorJob {
    monitor: Arc<Monitor>,
    frequency: JobFrequency,
}

impl GeofenceMonitorJob {
    /// Ticks once per sampling interval of the monitor.
    pub fn new(monitor: Arc<Monitor>) -> Self {
        let interval_ms = monitor.settings().interval.as_millis().max(1) as u64;
        Self {
            monitor,
            frequency: JobFrequency::Millis(interval_ms),
        }
    }
}

#[async_trait::async_trait]
impl Job for GeofenceMonitorJob {
    fn name(&self) -> &'static str {
        "geofence_monitor"
    }

    fn frequency(&self) -> JobFrequency {
        self.frequency
    }

    async fn execute(&self) -> Result<(), String> {
        self.execute_at(Instant::now()).await
    }

    async fn execute_at(&self, tick: Instant) -> Result<(), String> {
        let report = self
            .monitor
            .run_cycle_at(tick)
            .await
            .map_err(|e| format!("Monitor cycle skipped: {}", e))?;

        if report.failures > 0 {
            warn!(failures = report.failures, "Some wristbands could not be evaluated");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use domain::services::AlarmDedupPolicy;
    use persistence::MemoryStore;

    use crate::monitor::{MonitorSettings, Repositories};
    use crate::provider::ReplayLocationProvider;

    fn monitor(interval: Duration) -> Arc<Monitor> {
        let repos = Repositories::new(
            Arc::new(MemoryStore::new()),
            AlarmDedupPolicy::ZoneName,
            None,
        );
        Arc::new(Monitor::new(
            repos,
            Arc::new(ReplayLocationProvider::empty()),
            MonitorSettings {
                interval,
                ..MonitorSettings::default()
            },
        ))
    }

    #[test]
    fn test_frequency_follows_interval() {
        let job = GeofenceMonitorJob::new(monitor(Duration::from_millis(1500)));
        assert_eq!(job.name(), "geofence_monitor");
        assert_eq!(job.frequency(), JobFrequency::Millis(1500));
    }

    #[tokio::test]
    async fn test_execute_on_empty_store() {
        let job = GeofenceMonitorJob::new(monitor(Duration::from_secs(1)));
        assert!(job.execute().await.is_ok());
    }
}
