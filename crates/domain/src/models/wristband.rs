//! Wristband domain model.

use serde::{Deserialize, Serialize};

/// A tracked wristband, assigned to at most one zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wristband {
    pub id: String,
    pub name: String,
    pub active: bool,
    pub zone_id: Option<String>,
}

impl Wristband {
    /// The assigned zone id, treating an empty id as unassigned.
    pub fn assigned_zone_id(&self) -> Option<&str> {
        self.zone_id.as_deref().filter(|id| !id.trim().is_empty())
    }

    /// Returns true when the wristband should be evaluated at all.
    pub fn is_monitored(&self) -> bool {
        self.active && self.assigned_zone_id().is_some()
    }
}
