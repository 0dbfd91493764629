//! Zone (geofence) domain model.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::error::{validation_reason, DomainError};
use crate::models::Coordinate;

/// Daily window during which a zone is enforced.
///
/// Both bounds are wall-clock times of day. `start > end` spans midnight and
/// `start == end` means the zone is enforced all day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl ActiveWindow {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    /// Window with no time restriction.
    pub fn full_day() -> Self {
        Self {
            start: NaiveTime::MIN,
            end: NaiveTime::MIN,
        }
    }

    /// Returns true when the window wraps past midnight.
    pub fn wraps_midnight(&self) -> bool {
        self.start > self.end
    }

    /// Returns true for a zero-length window, which applies all day.
    pub fn is_unrestricted(&self) -> bool {
        self.start == self.end
    }
}

/// A circular zone that a wristband must stay inside while its window is active.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Zone {
    pub id: String,
    pub name: String,
    pub center: Coordinate,
    pub radius_meters: f64,
    pub active_window: ActiveWindow,
}

impl Zone {
    /// Creates a validated zone.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        center: Coordinate,
        radius_meters: f64,
        active_window: ActiveWindow,
    ) -> Result<Self, DomainError> {
        let id = id.into();

        if let Err(e) = shared::validation::validate_radius(radius_meters) {
            return Err(DomainError::InvalidZone {
                zone_id: id,
                reason: validation_reason(&e),
            });
        }

        if let Err(e) = center.validate() {
            return Err(DomainError::InvalidZone {
                zone_id: id,
                reason: e.to_string(),
            });
        }

        Ok(Self {
            id,
            name: name.into(),
            center,
            radius_meters,
            active_window,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn center() -> Coordinate {
        Coordinate::new(-23.5505, -46.6333).unwrap()
    }

    #[test]
    fn test_zone_new_valid() {
        let zone = Zone::new(
            "z1",
            "Garden",
            center(),
            50.0,
            ActiveWindow::new(hm(8, 0), hm(18, 0)),
        )
        .unwrap();
        assert_eq!(zone.id, "z1");
        assert_eq!(zone.name, "Garden");
        assert_eq!(zone.radius_meters, 50.0);
    }

    #[test]
    fn test_zone_new_rejects_non_positive_radius() {
        let err = Zone::new("z1", "Garden", center(), 0.0, ActiveWindow::full_day()).unwrap_err();
        match err {
            DomainError::InvalidZone { zone_id, reason } => {
                assert_eq!(zone_id, "z1");
                assert!(reason.contains("Radius"));
            }
            other => panic!("unexpected error: {:?}", other),
        }

        assert!(Zone::new("z1", "Garden", center(), -5.0, ActiveWindow::full_day()).is_err());
        assert!(Zone::new("z1", "Garden", center(), f64::NAN, ActiveWindow::full_day()).is_err());
    }

    #[test]
    fn test_zone_new_rejects_invalid_center() {
        let bad = Coordinate {
            latitude: 95.0,
            longitude: 0.0,
        };
        let err = Zone::new("z2", "Park", bad, 10.0, ActiveWindow::full_day()).unwrap_err();
        assert!(matches!(err, DomainError::InvalidZone { .. }));
    }

    #[test]
    fn test_active_window_shapes() {
        assert!(ActiveWindow::new(hm(22, 0), hm(6, 0)).wraps_midnight());
        assert!(!ActiveWindow::new(hm(8, 0), hm(18, 0)).wraps_midnight());
        assert!(ActiveWindow::full_day().is_unrestricted());
        assert!(ActiveWindow::new(hm(9, 15), hm(9, 15)).is_unrestricted());
    }
}
