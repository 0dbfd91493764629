use std::net::SocketAddr;
use std::time::Duration;

use chrono::{FixedOffset, Offset, Utc};
use serde::Deserialize;

use domain::services::AlarmDedupPolicy;

use crate::logging::LogFormat;
use crate::monitor::{LocationErrorPolicy, MonitorSettings};

/// Largest UTC offset in use anywhere, in minutes.
const MAX_UTC_OFFSET_MINUTES: i32 = 14 * 60;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub monitor: MonitorConfig,
    #[serde(default)]
    pub alarms: AlarmsConfig,
    #[serde(default)]
    pub trail: TrailConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub replay: ReplayConfig,
    pub logging: LoggingConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonitorConfig {
    /// Minimum time between two samples of the same wristband.
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    #[serde(default)]
    pub on_location_error: LocationErrorPolicy,

    /// Extra polls after a failed one under `retry_immediate`.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,

    #[serde(default = "default_backoff_max_ms")]
    pub backoff_max_ms: u64,

    /// How long a stop waits for the in-flight cycle.
    #[serde(default = "default_shutdown_timeout_secs")]
    pub shutdown_timeout_secs: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AlarmsConfig {
    #[serde(default)]
    pub dedup_policy: AlarmDedupPolicy,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TrailConfig {
    /// Samples kept per zone trail, oldest dropped first. 0 or unset keeps all.
    #[serde(default)]
    pub max_samples_per_zone: Option<usize>,

    /// Age after which samples are pruned by the retention job. 0 or unset keeps all.
    #[serde(default)]
    pub retention_days: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScheduleConfig {
    /// Offset of the wall clock that zone windows are written in.
    #[serde(default)]
    pub utc_offset_minutes: i32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    #[default]
    Memory,
    File,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,

    /// Directory of the file backend.
    #[serde(default)]
    pub path: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReplayConfig {
    /// JSON file of recorded positions per wristband.
    #[serde(default)]
    pub path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub format: LogFormat,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MetricsConfig {
    /// Listen address of the Prometheus exporter. Unset disables it.
    #[serde(default)]
    pub prometheus_addr: Option<String>,
}

// Default value functions
fn default_interval_ms() -> u64 {
    30_000
}
fn default_max_retries() -> u32 {
    2
}
fn default_backoff_base_ms() -> u64 {
    1_000
}
fn default_backoff_max_ms() -> u64 {
    60_000
}
fn default_shutdown_timeout_secs() -> u64 {
    30
}
fn default_log_level() -> String {
    "info".to_string()
}

/// Configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Loading order (later sources override earlier):
    /// 1. config/default.toml - base configuration with defaults
    /// 2. config/local.toml - local overrides (optional, not in git)
    /// 3. Environment variables with IFENCE__ prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(config::Environment::with_prefix("IFENCE").separator("__"))
            .build()?;

        let cfg: Self = config.try_deserialize()?;
        cfg.validate()
            .map_err(|e| config::ConfigError::Message(e.to_string()))?;
        Ok(cfg)
    }

    /// Load configuration for testing with custom overrides.
    #[cfg(test)]
    pub fn load_for_test(overrides: &[(&str, &str)]) -> Result<Self, config::ConfigError> {
        let defaults = r#"
            [monitor]
            interval_ms = 30000
            on_location_error = "skip_cycle"
            max_retries = 2
            backoff_base_ms = 1000
            backoff_max_ms = 60000
            shutdown_timeout_secs = 30

            [alarms]
            dedup_policy = "zone_name"

            [storage]
            backend = "memory"

            [schedule]
            utc_offset_minutes = 0

            [logging]
            level = "info"
            format = "json"
        "#;

        let mut builder = config::Config::builder()
            .add_source(config::File::from_str(defaults, config::FileFormat::Toml));

        for (key, value) in overrides {
            builder = builder.set_override(*key, *value)?;
        }

        builder.build()?.try_deserialize()
    }

    /// Validate configuration values.
    fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.monitor.interval_ms == 0 {
            return Err(ConfigValidationError::InvalidValue(
                "monitor.interval_ms cannot be 0".to_string(),
            ));
        }

        if self.monitor.backoff_base_ms > self.monitor.backoff_max_ms {
            return Err(ConfigValidationError::InvalidValue(
                "monitor.backoff_base_ms cannot exceed monitor.backoff_max_ms".to_string(),
            ));
        }

        if self.storage.backend == StorageBackend::File
            && self.storage.path.as_deref().map_or(true, str::is_empty)
        {
            return Err(ConfigValidationError::MissingRequired(
                "IFENCE__STORAGE__PATH must be set for the file backend".to_string(),
            ));
        }

        if self.schedule.utc_offset().is_none() {
            return Err(ConfigValidationError::InvalidValue(format!(
                "schedule.utc_offset_minutes must be within ±{} minutes",
                MAX_UTC_OFFSET_MINUTES
            )));
        }

        if let Some(addr) = &self.metrics.prometheus_addr {
            if addr.parse::<SocketAddr>().is_err() {
                return Err(ConfigValidationError::InvalidValue(format!(
                    "metrics.prometheus_addr '{}' is not a socket address",
                    addr
                )));
            }
        }

        Ok(())
    }

    pub fn monitor_settings(&self) -> MonitorSettings {
        MonitorSettings {
            interval: Duration::from_millis(self.monitor.interval_ms),
            on_location_error: self.monitor.on_location_error,
            max_retries: self.monitor.max_retries,
            backoff_base: Duration::from_millis(self.monitor.backoff_base_ms),
            backoff_max: Duration::from_millis(self.monitor.backoff_max_ms),
            utc_offset: self.schedule.utc_offset().unwrap_or_else(|| Utc.fix()),
        }
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.monitor.shutdown_timeout_secs)
    }
}

impl ScheduleConfig {
    pub fn utc_offset(&self) -> Option<FixedOffset> {
        if self.utc_offset_minutes.abs() > MAX_UTC_OFFSET_MINUTES {
            return None;
        }
        FixedOffset::east_opt(self.utc_offset_minutes * 60)
    }
}

impl TrailConfig {
    pub fn retention(&self) -> Option<u32> {
        self.retention_days.filter(|days| *days > 0)
    }
}

impl MetricsConfig {
    pub fn socket_addr(&self) -> Option<SocketAddr> {
        self.prometheus_addr.as_deref()?.parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    #[test]
    fn test_config_load_with_defaults() {
        let config = Config::load_for_test(&[]).expect("Failed to load config");

        assert_eq!(config.monitor.interval_ms, 30_000);
        assert_eq!(config.monitor.on_location_error, LocationErrorPolicy::SkipCycle);
        assert_eq!(config.alarms.dedup_policy, AlarmDedupPolicy::ZoneName);
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.trail.max_samples_per_zone, None);
        assert_eq!(config.trail.retention(), None);
        assert_eq!(config.metrics.socket_addr(), None);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_ok!(config.validate());
    }

    #[test]
    fn test_config_overrides() {
        let config = Config::load_for_test(&[
            ("monitor.interval_ms", "5000"),
            ("monitor.on_location_error", "backoff"),
            ("alarms.dedup_policy", "episode"),
            ("trail.max_samples_per_zone", "500"),
            ("trail.retention_days", "7"),
            ("schedule.utc_offset_minutes", "-180"),
            ("metrics.prometheus_addr", "127.0.0.1:9100"),
        ])
        .expect("Failed to load config");

        assert_eq!(config.monitor.on_location_error, LocationErrorPolicy::Backoff);
        assert_eq!(config.alarms.dedup_policy, AlarmDedupPolicy::Episode);
        assert_eq!(config.trail.max_samples_per_zone, Some(500));
        assert_eq!(config.trail.retention(), Some(7));
        assert_eq!(
            config.metrics.socket_addr().map(|a| a.to_string()),
            Some("127.0.0.1:9100".to_string())
        );
        assert_ok!(config.validate());

        let settings = config.monitor_settings();
        assert_eq!(settings.interval, Duration::from_secs(5));
        assert_eq!(settings.utc_offset.local_minus_utc(), -180 * 60);
    }

    #[test]
    fn test_config_validation_zero_interval() {
        let config =
            Config::load_for_test(&[("monitor.interval_ms", "0")]).expect("Failed to load config");
        let result = config.validate();
        assert!(result.unwrap_err().to_string().contains("interval_ms"));
    }

    #[test]
    fn test_config_validation_backoff_bounds() {
        let config = Config::load_for_test(&[
            ("monitor.backoff_base_ms", "10000"),
            ("monitor.backoff_max_ms", "1000"),
        ])
        .expect("Failed to load config");
        let result = config.validate();
        assert!(result.unwrap_err().to_string().contains("backoff_base_ms"));
    }

    #[test]
    fn test_config_validation_file_backend_needs_path() {
        let config =
            Config::load_for_test(&[("storage.backend", "file")]).expect("Failed to load config");
        let result = config.validate();
        assert!(result.unwrap_err().to_string().contains("IFENCE__STORAGE__PATH"));

        let config = Config::load_for_test(&[
            ("storage.backend", "file"),
            ("storage.path", "/var/lib/ifence"),
        ])
        .expect("Failed to load config");
        assert_ok!(config.validate());
    }

    #[test]
    fn test_config_validation_offset_range() {
        let config = Config::load_for_test(&[("schedule.utc_offset_minutes", "900")])
            .expect("Failed to load config");
        assert_err!(config.validate());

        let config = Config::load_for_test(&[("schedule.utc_offset_minutes", "-840")])
            .expect("Failed to load config");
        assert_ok!(config.validate());
    }

    #[test]
    fn test_config_validation_metrics_addr() {
        let config = Config::load_for_test(&[("metrics.prometheus_addr", "not an address")])
            .expect("Failed to load config");
        assert_err!(config.validate());
    }

    #[test]
    fn test_zero_retention_disables_pruning() {
        let config =
            Config::load_for_test(&[("trail.retention_days", "0")]).expect("Failed to load config");
        assert_eq!(config.trail.retention(), None);
    }
}
