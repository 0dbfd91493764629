//! One monitoring cycle over every active wristband.
//!
//! A cycle loads wristbands and zones once, then runs one independent unit
//! per due wristband: poll the provider, evaluate, commit the writes. Units
//! run concurrently and a failing unit only affects its own wristband.

mod pacing;

pub use pacing::{backoff_delay, with_jitter, LocationErrorPolicy, Pacer, Readiness};

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use chrono::{FixedOffset, Offset, Utc};
use serde::Serialize;
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

use domain::models::{PositionSample, Wristband, Zone};
use domain::services::{AlarmDedupPolicy, Evaluation, EpisodeTracker, GeofenceEvaluator, Transition};
use persistence::repositories::{
    AlarmHistoryRepository, LocationTrailRepository, WristbandRepository, ZoneRepository,
};
use persistence::KeyValueStore;

use crate::error::MonitorError;
use crate::metrics;
use crate::provider::{LocationError, LocationProvider};

/// Cadence and failure handling of the monitor.
#[derive(Debug, Clone)]
pub struct MonitorSettings {
    /// Minimum time between two samples of the same wristband.
    pub interval: Duration,
    pub on_location_error: LocationErrorPolicy,
    /// Extra polls after the first under [`LocationErrorPolicy::RetryImmediate`].
    pub max_retries: u32,
    pub backoff_base: Duration,
    pub backoff_max: Duration,
    /// Offset in which zone windows are read.
    pub utc_offset: FixedOffset,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
            on_location_error: LocationErrorPolicy::SkipCycle,
            max_retries: 2,
            backoff_base: Duration::from_secs(1),
            backoff_max: Duration::from_secs(60),
            utc_offset: Utc.fix(),
        }
    }
}

/// The repositories the monitor reads and writes, over one store.
#[derive(Clone)]
pub struct Repositories {
    pub zones: ZoneRepository,
    pub wristbands: WristbandRepository,
    pub trails: LocationTrailRepository,
    pub alarms: Arc<AlarmHistoryRepository>,
}

impl Repositories {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        dedup_policy: AlarmDedupPolicy,
        max_samples_per_zone: Option<usize>,
    ) -> Self {
        Self {
            zones: ZoneRepository::new(Arc::clone(&store)),
            wristbands: WristbandRepository::new(Arc::clone(&store)),
            trails: LocationTrailRepository::new(Arc::clone(&store))
                .with_max_samples(max_samples_per_zone),
            alarms: Arc::new(AlarmHistoryRepository::new(store, dedup_policy)),
        }
    }
}

/// Summary of one cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    /// Wristbands whose sample was evaluated and committed.
    pub evaluated: usize,
    /// Alarms recorded.
    pub alarms: usize,
    /// Wristbands without a resolvable zone.
    pub skipped: usize,
    /// Wristbands sampled less than one interval ago.
    pub not_due: usize,
    /// Wristbands waiting out a location failure backoff.
    pub backing_off: usize,
    /// Units that failed, including panics.
    pub failures: usize,
}

enum UnitOutcome {
    Evaluated { alarmed: bool },
    Skipped,
}

/// Drives the evaluator over every active wristband.
pub struct Monitor {
    repos: Repositories,
    provider: Arc<dyn LocationProvider>,
    evaluator: GeofenceEvaluator,
    settings: MonitorSettings,
    pacer: Mutex<Pacer>,
    episodes: Mutex<EpisodeTracker>,
    cycle_lock: Mutex<()>,
}

impl Monitor {
    pub fn new(
        repos: Repositories,
        provider: Arc<dyn LocationProvider>,
        settings: MonitorSettings,
    ) -> Self {
        Self {
            repos,
            provider,
            evaluator: GeofenceEvaluator::new(settings.utc_offset),
            pacer: Mutex::new(Pacer::new(settings.interval)),
            episodes: Mutex::new(EpisodeTracker::new()),
            cycle_lock: Mutex::new(()),
            settings,
        }
    }

    pub fn settings(&self) -> &MonitorSettings {
        &self.settings
    }

    pub fn repositories(&self) -> &Repositories {
        &self.repos
    }

    /// Runs one cycle now. Cycles never overlap.
    ///
    /// Only a failure to load wristbands or zones fails the cycle as a whole.
    pub async fn run_cycle(self: &Arc<Self>) -> Result<CycleReport, MonitorError> {
        self.run_cycle_at(Instant::now()).await
    }

    /// Runs the cycle scheduled for `slot`. Pacing is measured between
    /// slots, so a cycle that starts late does not make the next one early.
    pub async fn run_cycle_at(self: &Arc<Self>, slot: Instant) -> Result<CycleReport, MonitorError> {
        let _cycle = self.cycle_lock.lock().await;
        let span = info_span!("monitor_cycle", cycle_id = %Uuid::new_v4());
        self.cycle(slot).instrument(span).await
    }

    async fn cycle(self: &Arc<Self>, slot: Instant) -> Result<CycleReport, MonitorError> {
        let started = Instant::now();
        let mut report = CycleReport::default();

        let wristbands = self.repos.wristbands.list_active().await.map_err(|e| {
            error!(error = %e, "Failed to load wristbands, skipping cycle");
            MonitorError::from(e)
        })?;
        let zones = self.repos.zones.list_by_id().await.map_err(|e| {
            error!(error = %e, "Failed to load zones, skipping cycle");
            MonitorError::from(e)
        })?;

        let active: HashSet<&str> = wristbands.iter().map(|w| w.id.as_str()).collect();
        self.pacer.lock().await.retain(|id| active.contains(id));
        self.episodes.lock().await.retain(|id| active.contains(id));

        let mut units = JoinSet::new();
        for wristband in &wristbands {
            let Some(zone) = resolve_zone(wristband, &zones) else {
                let skip = MonitorError::ZoneUnresolved {
                    wristband_id: wristband.id.clone(),
                    zone_id: wristband.assigned_zone_id().map(str::to_string),
                };
                debug!(reason = %skip, "Skipping wristband");
                report.skipped += 1;
                continue;
            };

            match self.pacer.lock().await.poll(&wristband.id, slot) {
                Readiness::Due => {}
                Readiness::NotDue => {
                    report.not_due += 1;
                    continue;
                }
                Readiness::BackingOff => {
                    report.backing_off += 1;
                    continue;
                }
            }

            let monitor = Arc::clone(self);
            let wristband_id = wristband.id.clone();
            let span = info_span!("wristband", wristband_id = %wristband_id, zone_id = %zone.id);
            units.spawn(
                async move { monitor.run_unit(&wristband_id, zone).await }.instrument(span),
            );
        }

        while let Some(joined) = units.join_next().await {
            match joined {
                Ok(Ok(UnitOutcome::Evaluated { alarmed })) => {
                    report.evaluated += 1;
                    if alarmed {
                        report.alarms += 1;
                    }
                }
                Ok(Ok(UnitOutcome::Skipped)) => report.skipped += 1,
                Ok(Err(e)) => {
                    warn!(error = %e, kind = e.kind(), "Wristband evaluation failed");
                    metrics::record_unit_failure(e.kind());
                    report.failures += 1;
                }
                Err(e) => {
                    error!(error = %e, "Wristband evaluation task panicked");
                    metrics::record_unit_failure("panic");
                    report.failures += 1;
                }
            }
        }

        let elapsed = started.elapsed();
        metrics::record_cycle_duration(elapsed.as_secs_f64());
        info!(
            evaluated = report.evaluated,
            alarms = report.alarms,
            skipped = report.skipped,
            not_due = report.not_due,
            backing_off = report.backing_off,
            failures = report.failures,
            elapsed_ms = elapsed.as_millis() as u64,
            "Monitor cycle completed"
        );
        Ok(report)
    }

    async fn run_unit(&self, wristband_id: &str, zone: Zone) -> Result<UnitOutcome, MonitorError> {
        let sample = match self.acquire_sample(wristband_id).await {
            Ok(sample) => {
                self.pacer.lock().await.record_success(wristband_id);
                sample
            }
            Err(source) => {
                self.handle_location_failure(wristband_id).await;
                return Err(MonitorError::LocationUnavailable {
                    wristband_id: wristband_id.to_string(),
                    source,
                });
            }
        };

        let assessment = match self.evaluator.evaluate(Some(&zone), &sample)? {
            Evaluation::Evaluated(assessment) => assessment,
            Evaluation::Skipped(_) => return Ok(UnitOutcome::Skipped),
        };
        let verdict = assessment.verdict;

        let transition = self.episodes.lock().await.observe(
            wristband_id,
            &zone.id,
            &verdict,
            sample.timestamp,
        );
        log_transition(&transition, &zone);

        let mut trail_appended = false;
        if let Some(append) = assessment.effects.trail_append {
            self.repos.trails.append(&append.zone_id, &append.sample).await?;
            trail_appended = true;
        }
        let alarmed = match assessment.effects.alarm {
            Some(alarm) => {
                let alarm = match transition.open_episode_start() {
                    Some(episode_start) => alarm.with_episode_start(episode_start),
                    None => alarm,
                };
                let timestamp = alarm.timestamp;
                if let Err(e) = self.repos.alarms.record(alarm).await {
                    if trail_appended {
                        error!(
                            zone_id = %zone.id,
                            timestamp = %timestamp,
                            error = %e,
                            "Trail sample committed without its alarm"
                        );
                    }
                    return Err(e.into());
                }
                info!(
                    zone_name = %zone.name,
                    distance_meters = verdict.distance_meters,
                    "Wristband outside its zone during the active window"
                );
                true
            }
            None => false,
        };

        metrics::record_evaluation(alarmed);
        debug!(
            inside = verdict.inside,
            schedule_active = verdict.schedule_active,
            distance_meters = verdict.distance_meters,
            "Sample evaluated"
        );
        Ok(UnitOutcome::Evaluated { alarmed })
    }

    async fn acquire_sample(&self, wristband_id: &str) -> Result<PositionSample, LocationError> {
        let attempts = match self.settings.on_location_error {
            LocationErrorPolicy::RetryImmediate => self.settings.max_retries.saturating_add(1),
            LocationErrorPolicy::SkipCycle | LocationErrorPolicy::Backoff => 1,
        };

        let mut attempt = 1;
        loop {
            match self.provider.current_position(wristband_id).await {
                Ok(sample) => return Ok(sample),
                Err(e) => {
                    metrics::record_location_failure(self.settings.on_location_error.as_str());
                    if attempt >= attempts {
                        return Err(e);
                    }
                    debug!(attempt, error = %e, "Location poll failed, retrying");
                    attempt += 1;
                }
            }
        }
    }

    async fn handle_location_failure(&self, wristband_id: &str) {
        let mut pacer = self.pacer.lock().await;
        let failures = pacer.record_failure(wristband_id);

        if self.settings.on_location_error == LocationErrorPolicy::Backoff {
            let delay = with_jitter(backoff_delay(
                failures,
                self.settings.backoff_base,
                self.settings.backoff_max,
            ));
            pacer.defer_until(wristband_id, Instant::now() + delay);
            debug!(
                consecutive_failures = failures,
                delay_ms = delay.as_millis() as u64,
                "Backing off location polling"
            );
        }
    }

    /// Consecutive location failures of `wristband_id`.
    pub async fn consecutive_failures(&self, wristband_id: &str) -> u32 {
        self.pacer.lock().await.consecutive_failures(wristband_id)
    }

    /// Start of the open alarm episode of `wristband_id`, if any.
    pub async fn open_episode(&self, wristband_id: &str) -> Option<chrono::DateTime<Utc>> {
        self.episodes.lock().await.open_episode(wristband_id)
    }
}

fn resolve_zone(wristband: &Wristband, zones: &HashMap<String, Zone>) -> Option<Zone> {
    wristband
        .assigned_zone_id()
        .and_then(|zone_id| zones.get(zone_id))
        .cloned()
}

fn log_transition(transition: &Transition, zone: &Zone) {
    match transition {
        Transition::Started { started_at } => {
            info!(zone_name = %zone.name, started_at = %started_at, "Exit episode started");
        }
        Transition::Ended {
            started_at,
            ended_at,
        } => {
            info!(
                zone_name = %zone.name,
                started_at = %started_at,
                ended_at = %ended_at,
                "Exit episode ended"
            );
        }
        Transition::Continued { .. } | Transition::Idle => {}
    }
}
