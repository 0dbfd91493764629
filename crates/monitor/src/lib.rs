//! Runtime for the iFence geofence monitor: configuration, logging, the
//! location provider contract, the evaluation cycle and the job scheduler
//! that drives it.

pub mod config;
pub mod error;
pub mod jobs;
pub mod logging;
pub mod metrics;
pub mod monitor;
pub mod provider;

pub use error::MonitorError;
pub use monitor::{CycleReport, LocationErrorPolicy, Monitor, MonitorSettings, Repositories};
pub use provider::{LocationError, LocationProvider};
