//! Common fixtures for monitor integration tests.

// Not every test file uses every fixture.
#![allow(dead_code)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::{json, Value};
use tokio::sync::Mutex;

use domain::models::PositionSample;
use domain::services::{AlarmDedupPolicy, EARTH_RADIUS_METERS};
use ifence_monitor::{
    LocationError, LocationErrorPolicy, LocationProvider, Monitor, MonitorSettings, Repositories,
};
use persistence::keys::{WRISTBANDS_KEY, ZONES_KEY};
use persistence::{KeyValueStore, MemoryStore, StoreError};

pub const GARDEN_CENTER: (f64, f64) = (-23.5505, -46.6333);
pub const SCHOOL_CENTER: (f64, f64) = (-23.5600, -46.6400);

/// `2024-05-01T<hour>:<minute>:00Z`.
pub fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(2024, 5, 1)
        .unwrap()
        .and_hms_opt(hour, minute, 0)
        .unwrap()
        .and_utc()
}

/// A sample `meters` due north of `center`.
pub fn north_of(center: (f64, f64), meters: f64, timestamp: DateTime<Utc>) -> PositionSample {
    let dlat = (meters / EARTH_RADIUS_METERS).to_degrees();
    PositionSample::new(center.0 + dlat, center.1, timestamp)
}

pub fn zone_json(id: &str, name: &str, center: (f64, f64), radius: f64, window: (&str, &str)) -> Value {
    json!({
        "id": id,
        "nome": name,
        "latitude": center.0,
        "longitude": center.1,
        "raio": radius,
        "horarioInicio": window.0,
        "horarioFim": window.1,
    })
}

pub fn garden() -> Value {
    zone_json("z1", "Garden", GARDEN_CENTER, 50.0, ("08:00", "18:00"))
}

pub fn school() -> Value {
    zone_json("z2", "School", SCHOOL_CENTER, 100.0, ("07:00", "17:00"))
}

pub fn wristband_json(id: &str, active: bool, zone_id: &str) -> Value {
    json!({
        "id": id,
        "nome": format!("Wristband {}", id),
        "ativa": active,
        "cercaId": zone_id,
    })
}

pub async fn seed(store: &dyn KeyValueStore, zones: Vec<Value>, wristbands: Vec<Value>) {
    store
        .set(ZONES_KEY, Value::Array(zones).to_string())
        .await
        .unwrap();
    store
        .set(WRISTBANDS_KEY, Value::Array(wristbands).to_string())
        .await
        .unwrap();
}

pub fn settings() -> MonitorSettings {
    MonitorSettings {
        interval: Duration::from_millis(100),
        ..MonitorSettings::default()
    }
}

pub fn settings_with_policy(policy: LocationErrorPolicy) -> MonitorSettings {
    MonitorSettings {
        on_location_error: policy,
        ..settings()
    }
}

pub fn build_monitor(
    store: Arc<dyn KeyValueStore>,
    provider: Arc<ScriptedProvider>,
    dedup_policy: AlarmDedupPolicy,
    settings: MonitorSettings,
) -> Arc<Monitor> {
    let repos = Repositories::new(store, dedup_policy, None);
    Arc::new(Monitor::new(repos, provider, settings))
}

/// Location provider with per-wristband scripts.
///
/// Scripted steps are consumed first; after that a fixed sample is returned
/// if one is set, otherwise `Unavailable`.
#[derive(Default)]
pub struct ScriptedProvider {
    scripts: Mutex<HashMap<String, VecDeque<Result<PositionSample, LocationError>>>>,
    fixed: Mutex<HashMap<String, PositionSample>>,
    panics: Mutex<HashSet<String>>,
    calls: Mutex<HashMap<String, usize>>,
    total_calls: AtomicUsize,
}

impl ScriptedProvider {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub async fn push(&self, wristband_id: &str, step: Result<PositionSample, LocationError>) {
        self.scripts
            .lock()
            .await
            .entry(wristband_id.to_string())
            .or_default()
            .push_back(step);
    }

    pub async fn push_sample(&self, wristband_id: &str, sample: PositionSample) {
        self.push(wristband_id, Ok(sample)).await;
    }

    pub async fn push_unavailable(&self, wristband_id: &str) {
        self.push(
            wristband_id,
            Err(LocationError::Unavailable("no fix".to_string())),
        )
        .await;
    }

    pub async fn set_fixed(&self, wristband_id: &str, sample: PositionSample) {
        self.fixed
            .lock()
            .await
            .insert(wristband_id.to_string(), sample);
    }

    pub async fn panic_for(&self, wristband_id: &str) {
        self.panics.lock().await.insert(wristband_id.to_string());
    }

    pub async fn calls(&self, wristband_id: &str) -> usize {
        self.calls
            .lock()
            .await
            .get(wristband_id)
            .copied()
            .unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.total_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LocationProvider for ScriptedProvider {
    async fn current_position(&self, wristband_id: &str) -> Result<PositionSample, LocationError> {
        self.total_calls.fetch_add(1, Ordering::SeqCst);
        *self
            .calls
            .lock()
            .await
            .entry(wristband_id.to_string())
            .or_default() += 1;

        if self.panics.lock().await.contains(wristband_id) {
            panic!("provider crashed for {}", wristband_id);
        }

        let scripted = self
            .scripts
            .lock()
            .await
            .get_mut(wristband_id)
            .and_then(VecDeque::pop_front);
        if let Some(step) = scripted {
            return step;
        }

        match self.fixed.lock().await.get(wristband_id) {
            Some(sample) => Ok(sample.clone()),
            None => Err(LocationError::Unavailable("script exhausted".to_string())),
        }
    }
}

/// Memory store that rejects operations on chosen keys.
#[derive(Default)]
pub struct FailingStore {
    inner: MemoryStore,
    failing_reads: Mutex<HashSet<String>>,
    failing_writes: Mutex<HashSet<String>>,
}

impl FailingStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub async fn fail_reads_of(&self, key: &str) {
        self.failing_reads.lock().await.insert(key.to_string());
    }

    pub async fn fail_writes_to(&self, key: &str) {
        self.failing_writes.lock().await.insert(key.to_string());
    }
}

#[async_trait]
impl KeyValueStore for FailingStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        if self.failing_reads.lock().await.contains(key) {
            return Err(StoreError::Backend(format!("read of '{}' rejected", key)));
        }
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        if self.failing_writes.lock().await.contains(key) {
            return Err(StoreError::Backend(format!("write of '{}' rejected", key)));
        }
        self.inner.set(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        if self.failing_writes.lock().await.contains(key) {
            return Err(StoreError::Backend(format!("removal of '{}' rejected", key)));
        }
        self.inner.remove(key).await
    }
}
