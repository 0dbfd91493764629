//! Repository implementations over the key-value store.
//!
//! Values are JSON arrays. A missing key or an undecodable value reads as an
//! empty collection; an undecodable element is skipped and the rest kept.

pub mod alarm_history;
pub mod location_trail;
pub mod wristband;
pub mod zone;

pub use alarm_history::AlarmHistoryRepository;
pub use location_trail::LocationTrailRepository;
pub use wristband::WristbandRepository;
pub use zone::ZoneRepository;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::store::{KeyValueStore, StoreError};

/// Reads the raw JSON array stored under `key`.
pub(crate) async fn load_raw_array(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Vec<Value>, StoreError> {
    let Some(text) = store.get(key).await? else {
        return Ok(Vec::new());
    };

    match serde_json::from_str::<Vec<Value>>(&text) {
        Ok(values) => Ok(values),
        Err(e) => {
            warn!(key = %key, error = %e, "Stored value is not a JSON array, treating as empty");
            Ok(Vec::new())
        }
    }
}

/// Decodes each element, skipping the ones that do not fit `T`.
pub(crate) fn decode_elements<T: DeserializeOwned>(key: &str, raw: Vec<Value>) -> Vec<T> {
    raw.into_iter()
        .enumerate()
        .filter_map(|(index, value)| match serde_json::from_value::<T>(value) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                warn!(key = %key, index, error = %e, "Skipping undecodable stored element");
                None
            }
        })
        .collect()
}

pub(crate) fn encode_element<T: Serialize>(key: &str, element: &T) -> Result<Value, StoreError> {
    serde_json::to_value(element).map_err(|source| StoreError::Encode {
        key: key.to_string(),
        source,
    })
}

pub(crate) async fn save_raw_array(
    store: &dyn KeyValueStore,
    key: &str,
    values: &[Value],
) -> Result<(), StoreError> {
    let text = serde_json::to_string(values).map_err(|source| StoreError::Encode {
        key: key.to_string(),
        source,
    })?;
    store.set(key, text).await
}
