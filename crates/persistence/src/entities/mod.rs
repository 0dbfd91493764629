//! Entity definitions matching the JSON the mobile app stores.
//!
//! Field names follow the app's storage format, so they differ from the
//! domain names.

pub mod alarm;
pub mod trail;
pub mod wristband;
pub mod zone;

pub use alarm::AlarmEntity;
pub use trail::TrailEntryEntity;
pub use wristband::WristbandEntity;
pub use zone::ZoneEntity;

use serde::de::{self, Deserializer};
use serde::Deserialize;

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(f64),
    Text(String),
}

/// Accepts a JSON number or a numeric string. Map screens store
/// coordinates as the text of an input field.
pub(crate) fn number_or_string<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(n) => Ok(n),
        NumberOrString::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| de::Error::custom(format!("expected a number, found '{}'", s))),
    }
}
