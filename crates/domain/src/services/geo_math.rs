//! Great-circle distance on a spherical Earth.

use crate::error::DomainError;
use crate::models::Coordinate;

/// Mean Earth radius used by the haversine formula.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Haversine distance in meters between two coordinates.
///
/// Both inputs are validated; `NaN` or out-of-range components are rejected
/// with [`DomainError::InvalidCoordinate`].
pub fn distance_meters(a: &Coordinate, b: &Coordinate) -> Result<f64, DomainError> {
    a.validate()?;
    b.validate()?;

    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let dlat = (b.latitude - a.latitude).to_radians();
    let dlon = (b.longitude - a.longitude).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    // Rounding can push h marginally above 1 for antipodal points.
    let c = 2.0 * h.min(1.0).sqrt().asin();

    Ok(EARTH_RADIUS_METERS * c)
}
