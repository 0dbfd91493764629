//! Storage keys shared with the mobile app.

/// Array of zones.
pub const ZONES_KEY: &str = "@cercas";

/// Array of wristbands.
pub const WRISTBANDS_KEY: &str = "@pulseiras";

/// Array of alarm records.
pub const ALARM_HISTORY_KEY: &str = "historico_alarmes";

const TRAIL_KEY_PREFIX: &str = "localizacoes_";

/// Key of the location trail recorded against `zone_id`.
pub fn trail_key(zone_id: &str) -> String {
    format!("{}{}", TRAIL_KEY_PREFIX, zone_id)
}
