//! Domain models for the geofence core.

pub mod alarm;
pub mod coordinate;
pub mod wristband;
pub mod zone;

pub use alarm::AlarmRecord;
pub use coordinate::{Coordinate, PositionSample};
pub use wristband::Wristband;
pub use zone::{ActiveWindow, Zone};
