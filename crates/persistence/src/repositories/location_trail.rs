//! Location trail repository.
//!
//! Each zone has an append-only trail of the samples that raised alarms.
//! Appends to the same zone are serialized; reads see whole values only.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use domain::models::PositionSample;

use super::{decode_elements, encode_element, load_raw_array, save_raw_array};
use crate::entities::TrailEntryEntity;
use crate::keys::trail_key;
use crate::locks::KeyedLocks;
use crate::metrics::StoreTimer;
use crate::store::{KeyValueStore, StoreError};

/// Repository for per-zone location trails.
#[derive(Clone)]
pub struct LocationTrailRepository {
    store: Arc<dyn KeyValueStore>,
    locks: Arc<KeyedLocks>,
    max_samples_per_zone: Option<usize>,
}

impl LocationTrailRepository {
    /// Creates a repository with unbounded trails.
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            locks: Arc::new(KeyedLocks::new()),
            max_samples_per_zone: None,
        }
    }

    /// Caps each trail at `max` entries, dropping the oldest on append.
    pub fn with_max_samples(mut self, max: Option<usize>) -> Self {
        self.max_samples_per_zone = max.filter(|m| *m > 0);
        self
    }

    /// Appends `sample` to the trail of `zone_id` and returns the trail length.
    ///
    /// Entries keep commit order; they are not sorted by timestamp.
    pub async fn append(&self, zone_id: &str, sample: &PositionSample) -> Result<usize, StoreError> {
        let key = trail_key(zone_id);
        let _guard = self.locks.acquire(&key).await;
        let timer = StoreTimer::new("trail.append");

        let mut raw = load_raw_array(self.store.as_ref(), &key).await?;
        raw.push(encode_element(&key, &TrailEntryEntity::from(sample))?);

        if let Some(max) = self.max_samples_per_zone {
            if raw.len() > max {
                let excess = raw.len() - max;
                raw.drain(..excess);
                debug!(zone_id = %zone_id, dropped = excess, max, "Trail capped");
            }
        }

        let result = save_raw_array(self.store.as_ref(), &key, &raw).await;
        timer.record();
        result.map(|()| raw.len())
    }

    /// The trail of `zone_id` in commit order.
    pub async fn list(&self, zone_id: &str) -> Result<Vec<PositionSample>, StoreError> {
        let key = trail_key(zone_id);
        let timer = StoreTimer::new("trail.list");
        let raw = load_raw_array(self.store.as_ref(), &key).await;
        timer.record();

        Ok(decode_elements::<TrailEntryEntity>(&key, raw?)
            .into_iter()
            .map(PositionSample::from)
            .collect())
    }

    /// Drops entries with a timestamp before `cutoff`. Returns how many were removed.
    ///
    /// Entries that cannot be decoded are kept untouched.
    pub async fn prune_older_than(
        &self,
        zone_id: &str,
        cutoff: DateTime<Utc>,
    ) -> Result<usize, StoreError> {
        let key = trail_key(zone_id);
        let _guard = self.locks.acquire(&key).await;
        let timer = StoreTimer::new("trail.prune");

        let raw = load_raw_array(self.store.as_ref(), &key).await?;
        let before = raw.len();
        let kept: Vec<_> = raw
            .into_iter()
            .filter(|value| {
                match serde_json::from_value::<TrailEntryEntity>(value.clone()) {
                    Ok(entry) => entry.timestamp >= cutoff,
                    Err(_) => true,
                }
            })
            .collect();
        let removed = before - kept.len();

        let result = if removed == 0 {
            Ok(())
        } else if kept.is_empty() {
            self.store.remove(&key).await
        } else {
            save_raw_array(self.store.as_ref(), &key, &kept).await
        };
        timer.record();
        result.map(|()| removed)
    }

    /// Removes the whole trail of `zone_id`.
    pub async fn clear(&self, zone_id: &str) -> Result<(), StoreError> {
        let key = trail_key(zone_id);
        let _guard = self.locks.acquire(&key).await;
        let result = self.store.remove(&key).await;
        if result.is_err() {
            warn!(zone_id = %zone_id, "Failed to clear trail");
        }
        result
    }
}
