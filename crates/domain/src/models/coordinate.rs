//! Coordinates and position samples.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{validation_reason, DomainError};

/// A WGS84 coordinate in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    /// Creates a validated coordinate.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, DomainError> {
        let coordinate = Self {
            latitude,
            longitude,
        };
        coordinate.validate()?;
        Ok(coordinate)
    }

    /// Checks that both components are finite and within range.
    pub fn validate(&self) -> Result<(), DomainError> {
        shared::validation::validate_latitude(self.latitude)
            .and_then(|_| shared::validation::validate_longitude(self.longitude))
            .map_err(|e| DomainError::InvalidCoordinate {
                latitude: self.latitude,
                longitude: self.longitude,
                reason: validation_reason(&e),
            })
    }
}

/// A timestamped position reported by the location provider.
///
/// Samples are not assumed to arrive in timestamp order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionSample {
    #[serde(flatten)]
    pub coordinate: Coordinate,
    pub timestamp: DateTime<Utc>,
}

impl PositionSample {
    /// Creates a sample without validating the coordinate.
    ///
    /// Provider output is validated when it is evaluated.
    pub fn new(latitude: f64, longitude: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            coordinate: Coordinate {
                latitude,
                longitude,
            },
            timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinate_new_valid() {
        let c = Coordinate::new(-23.5505, -46.6333).unwrap();
        assert_eq!(c.latitude, -23.5505);
        assert_eq!(c.longitude, -46.6333);
    }

    #[test]
    fn test_coordinate_new_rejects_out_of_range() {
        let err = Coordinate::new(91.0, 0.0).unwrap_err();
        assert!(matches!(err, DomainError::InvalidCoordinate { .. }));
        assert!(err.to_string().contains("Latitude must be between -90 and 90"));

        let err = Coordinate::new(0.0, -181.0).unwrap_err();
        assert!(err.to_string().contains("Longitude"));
    }

    #[test]
    fn test_coordinate_new_rejects_nan() {
        assert!(Coordinate::new(f64::NAN, 0.0).is_err());
        assert!(Coordinate::new(0.0, f64::NAN).is_err());
    }

    #[test]
    fn test_position_sample_serialization_is_flat() {
        let ts = DateTime::parse_from_rfc3339("2024-05-01T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let sample = PositionSample::new(1.5, 2.5, ts);
        let json = serde_json::to_string(&sample).unwrap();
        assert!(json.contains("\"latitude\":1.5"));
        assert!(json.contains("\"longitude\":2.5"));
        assert!(json.contains("\"timestamp\":\"2024-05-01T10:00:00Z\""));
        assert!(!json.contains("coordinate"));
    }
}
