//! Wristband entity (stored under `@pulseiras`).

use serde::{Deserialize, Serialize};
use validator::Validate;

use domain::models::Wristband;

/// Stored wristband record.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct WristbandEntity {
    #[validate(length(min = 1, message = "Wristband id is required"))]
    pub id: String,

    #[serde(rename = "nome", default)]
    pub name: String,

    #[serde(rename = "ativa", default)]
    pub active: bool,

    #[serde(rename = "cercaId", default)]
    pub zone_id: Option<String>,
}

impl From<WristbandEntity> for Wristband {
    fn from(entity: WristbandEntity) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
            active: entity.active,
            zone_id: entity.zone_id.filter(|id| !id.trim().is_empty()),
        }
    }
}

impl From<&Wristband> for WristbandEntity {
    fn from(wristband: &Wristband) -> Self {
        Self {
            id: wristband.id.clone(),
            name: wristband.name.clone(),
            active: wristband.active,
            zone_id: wristband.zone_id.clone(),
        }
    }
}
