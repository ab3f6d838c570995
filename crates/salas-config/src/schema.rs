//! Raw configuration schema (as parsed from TOML)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw configuration as parsed from TOML
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawConfig {
    /// Config schema version
    pub config_version: u32,

    /// Store location
    #[serde(default)]
    pub store: RawStoreConfig,

    /// Booking rules
    #[serde(default)]
    pub rules: RawRules,

    /// Catalog records to seed the store with
    #[serde(default)]
    pub catalog: RawCatalog,
}

/// Store settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawStoreConfig {
    /// Data directory (default: ~/.local/share/salas)
    pub data_dir: Option<PathBuf>,

    /// Database file; overrides `data_dir`/salas.db
    pub database: Option<PathBuf>,
}

/// Fair-use and sanction rules
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawRules {
    /// Same-day open-room booking cap per participant, in minutes
    pub daily_quota_minutes: Option<u32>,

    /// Active open-room bookings allowed per participant per ISO week
    pub weekly_active_limit: Option<u32>,

    /// Length of an automatic no-show sanction, in months
    pub sanction_months: Option<u32>,
}

/// Catalog seed
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawCatalog {
    #[serde(default)]
    pub programs: Vec<RawProgram>,

    #[serde(default)]
    pub rooms: Vec<RawRoom>,

    #[serde(default)]
    pub slots: Vec<RawSlot>,

    #[serde(default)]
    pub participants: Vec<RawParticipant>,
}

/// Academic program
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawProgram {
    pub name: String,

    /// "undergrad" or "grad"
    pub level: String,
}

/// Room definition
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawRoom {
    pub building: String,
    pub name: String,
    pub capacity: u32,

    /// "open", "grad_only" or "faculty_only"
    #[serde(rename = "type", default = "default_room_type")]
    pub room_type: String,
}

fn default_room_type() -> String {
    "open".to_string()
}

/// Time slot definition
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawSlot {
    pub id: i64,

    /// Start time (HH:MM)
    pub start: String,

    /// End time (HH:MM)
    pub end: String,
}

/// Participant definition
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawParticipant {
    /// National ID, normalized on load
    pub id: String,

    /// "student", "faculty" or "grad_student"
    pub profile: String,

    #[serde(default)]
    pub programs: Vec<RawProgramLink>,
}

/// Participant-to-program link
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawProgramLink {
    pub program: String,

    /// "student" or "faculty"
    #[serde(default = "default_role")]
    pub role: String,
}

fn default_role() -> String {
    "student".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_catalog_tables() {
        let toml_str = r#"
            config_version = 1

            [[catalog.programs]]
            name = "Ingenieria"
            level = "undergrad"

            [[catalog.rooms]]
            building = "Sede Central"
            name = "Lab-1"
            capacity = 2

            [[catalog.slots]]
            id = 1
            start = "08:00"
            end = "09:00"

            [[catalog.participants]]
            id = "4.123.456-7"
            profile = "student"
            programs = [{ program = "Ingenieria" }]
        "#;

        let config: RawConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.catalog.rooms.len(), 1);
        assert_eq!(config.catalog.rooms[0].room_type, "open");
        assert_eq!(config.catalog.participants[0].programs[0].role, "student");
        assert!(config.rules.daily_quota_minutes.is_none());
    }

    #[test]
    fn parse_rules() {
        let toml_str = r#"
            config_version = 1

            [rules]
            daily_quota_minutes = 180
            weekly_active_limit = 5
        "#;

        let config: RawConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.rules.daily_quota_minutes, Some(180));
        assert_eq!(config.rules.weekly_active_limit, Some(5));
        assert_eq!(config.rules.sanction_months, None);
    }
}
