//! Zone entity (stored under `@cercas`).

use serde::{Deserialize, Serialize};
use validator::Validate;

use domain::models::{ActiveWindow, Coordinate, Zone};
use domain::DomainError;
use shared::time::{format_time_of_day, parse_time_of_day};

use super::number_or_string;

/// Stored zone record.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ZoneEntity {
    #[validate(length(min = 1, message = "Zone id is required"))]
    pub id: String,

    #[serde(rename = "nome", default)]
    pub name: String,

    #[serde(deserialize_with = "number_or_string")]
    #[validate(range(min = -90.0, max = 90.0, message = "Latitude must be between -90 and 90"))]
    pub latitude: f64,

    #[serde(deserialize_with = "number_or_string")]
    #[validate(range(min = -180.0, max = 180.0, message = "Longitude must be between -180 and 180"))]
    pub longitude: f64,

    #[serde(rename = "raio", deserialize_with = "number_or_string")]
    pub radius_meters: f64,

    #[serde(rename = "horarioInicio")]
    pub window_start: String,

    #[serde(rename = "horarioFim")]
    pub window_end: String,
}

impl ZoneEntity {
    /// Validates the record and converts it to a domain zone.
    pub fn into_domain(self) -> Result<Zone, DomainError> {
        if let Err(errors) = self.validate() {
            return Err(DomainError::InvalidZone {
                zone_id: self.id,
                reason: errors.to_string(),
            });
        }

        let window = ActiveWindow::new(
            parse_time_of_day(&self.window_start)?,
            parse_time_of_day(&self.window_end)?,
        );
        let center = Coordinate::new(self.latitude, self.longitude)?;

        Zone::new(self.id, self.name, center, self.radius_meters, window)
    }
}

impl From<&Zone> for ZoneEntity {
    fn from(zone: &Zone) -> Self {
        Self {
            id: zone.id.clone(),
            name: zone.name.clone(),
            latitude: zone.center.latitude,
            longitude: zone.center.longitude,
            radius_meters: zone.radius_meters,
            window_start: format_time_of_day(zone.active_window.start),
            window_end: format_time_of_day(zone.active_window.end),
        }
    }
}
