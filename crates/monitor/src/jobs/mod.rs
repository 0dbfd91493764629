//! Periodic background jobs.

mod monitor_job;
mod scheduler;
mod trail_retention;

pub use monitor_job::GeofenceMonitorJob;
pub use scheduler::{Job, JobFrequency, JobScheduler};
pub use trail_retention::TrailRetentionJob;
