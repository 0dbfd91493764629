//! Wristband repository.

use std::sync::Arc;

use tracing::warn;
use validator::Validate;

use domain::models::Wristband;

use super::{decode_elements, load_raw_array};
use crate::entities::WristbandEntity;
use crate::keys::WRISTBANDS_KEY;
use crate::metrics::StoreTimer;
use crate::store::{KeyValueStore, StoreError};

/// Read access to the stored wristbands.
#[derive(Clone)]
pub struct WristbandRepository {
    store: Arc<dyn KeyValueStore>,
}

impl WristbandRepository {
    /// Creates a new WristbandRepository over the given store.
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// All valid wristbands, in stored order.
    pub async fn list(&self) -> Result<Vec<Wristband>, StoreError> {
        let timer = StoreTimer::new("wristbands.list");
        let raw = load_raw_array(self.store.as_ref(), WRISTBANDS_KEY).await;
        timer.record();

        let wristbands = decode_elements::<WristbandEntity>(WRISTBANDS_KEY, raw?)
            .into_iter()
            .filter_map(|entity| match entity.validate() {
                Ok(()) => Some(Wristband::from(entity)),
                Err(e) => {
                    warn!(error = %e, "Skipping invalid wristband");
                    None
                }
            })
            .collect();

        Ok(wristbands)
    }

    /// Wristbands with the active toggle on, assigned or not.
    pub async fn list_active(&self) -> Result<Vec<Wristband>, StoreError> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .filter(|w| w.active)
            .collect())
    }
}
