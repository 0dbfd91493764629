//! Zone repository. Zones are owned by the app's CRUD screens; this side only reads.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::warn;

use domain::models::Zone;

use super::{decode_elements, load_raw_array};
use crate::entities::ZoneEntity;
use crate::keys::ZONES_KEY;
use crate::metrics::StoreTimer;
use crate::store::{KeyValueStore, StoreError};

/// Read access to the stored zones.
#[derive(Clone)]
pub struct ZoneRepository {
    store: Arc<dyn KeyValueStore>,
}

impl ZoneRepository {
    /// Creates a new ZoneRepository over the given store.
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// All valid zones, in stored order. Invalid records are skipped.
    pub async fn list(&self) -> Result<Vec<Zone>, StoreError> {
        let timer = StoreTimer::new("zones.list");
        let raw = load_raw_array(self.store.as_ref(), ZONES_KEY).await;
        timer.record();

        let zones = decode_elements::<ZoneEntity>(ZONES_KEY, raw?)
            .into_iter()
            .filter_map(|entity| {
                let zone_id = entity.id.clone();
                match entity.into_domain() {
                    Ok(zone) => Some(zone),
                    Err(e) => {
                        warn!(zone_id = %zone_id, error = %e, "Skipping invalid zone");
                        None
                    }
                }
            })
            .collect();

        Ok(zones)
    }

    /// All valid zones keyed by id. On duplicate ids the first one wins.
    pub async fn list_by_id(&self) -> Result<HashMap<String, Zone>, StoreError> {
        let mut by_id = HashMap::new();
        for zone in self.list().await? {
            by_id.entry(zone.id.clone()).or_insert(zone);
        }
        Ok(by_id)
    }
}
