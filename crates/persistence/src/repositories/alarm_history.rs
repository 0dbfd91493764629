//! Alarm history repository.
//!
//! Every alarm is written; duplicates are filtered when the history is read
//! back, according to the configured [`AlarmDedupPolicy`].

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info};

use domain::models::AlarmRecord;
use domain::services::AlarmDedupPolicy;

use super::{decode_elements, encode_element, load_raw_array, save_raw_array};
use crate::entities::AlarmEntity;
use crate::keys::ALARM_HISTORY_KEY;
use crate::metrics::StoreTimer;
use crate::store::{KeyValueStore, StoreError};

/// Repository for the deduplicated alarm history.
pub struct AlarmHistoryRepository {
    store: Arc<dyn KeyValueStore>,
    policy: AlarmDedupPolicy,
    write_lock: Mutex<()>,
    /// Bumped by every successful clear.
    generation: AtomicU64,
}

impl AlarmHistoryRepository {
    /// Creates a new repository using the given dedup policy.
    pub fn new(store: Arc<dyn KeyValueStore>, policy: AlarmDedupPolicy) -> Self {
        Self {
            store,
            policy,
            write_lock: Mutex::new(()),
            generation: AtomicU64::new(0),
        }
    }

    /// Appends `alarm` to the history. Duplicates are accepted.
    ///
    /// The call is bound to the history as it is when `record` is called: if
    /// [`clear`](Self::clear) lands before this write is committed, the write
    /// is dropped.
    pub fn record(
        &self,
        alarm: AlarmRecord,
    ) -> impl Future<Output = Result<(), StoreError>> + Send + '_ {
        let issued_in = self.generation.load(Ordering::Acquire);

        async move {
            let _guard = self.write_lock.lock().await;
            if self.generation.load(Ordering::Acquire) != issued_in {
                debug!(
                    zone_name = %alarm.zone_name,
                    "Dropping alarm issued before the history was cleared"
                );
                return Ok(());
            }

            let timer = StoreTimer::new("alarm_history.record");
            let mut raw = load_raw_array(self.store.as_ref(), ALARM_HISTORY_KEY).await?;
            raw.push(encode_element(ALARM_HISTORY_KEY, &AlarmEntity::from(&alarm))?);
            let result = save_raw_array(self.store.as_ref(), ALARM_HISTORY_KEY, &raw).await;
            timer.record();
            result
        }
    }

    /// The history with duplicates removed, first occurrence kept, in commit order.
    pub async fn list_unique(&self) -> Result<Vec<AlarmRecord>, StoreError> {
        Ok(self.policy.unique(self.list_all().await?))
    }

    /// Every stored alarm, duplicates included.
    pub async fn list_all(&self) -> Result<Vec<AlarmRecord>, StoreError> {
        let timer = StoreTimer::new("alarm_history.list");
        let raw = load_raw_array(self.store.as_ref(), ALARM_HISTORY_KEY).await;
        timer.record();

        Ok(decode_elements::<AlarmEntity>(ALARM_HISTORY_KEY, raw?)
            .into_iter()
            .map(AlarmRecord::from)
            .collect())
    }

    /// Wipes the whole history in one store operation.
    pub async fn clear(&self) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let timer = StoreTimer::new("alarm_history.clear");
        let result = self.store.remove(ALARM_HISTORY_KEY).await;
        timer.record();
        result?;

        self.generation.fetch_add(1, Ordering::AcqRel);
        info!("Alarm history cleared");
        Ok(())
    }
}
