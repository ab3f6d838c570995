//! Validated configuration structures

use crate::schema::{RawCatalog, RawConfig, RawParticipant, RawRules, RawSlot, RawStoreConfig};
use chrono::Duration;
use salas_api::{Catalog, Participant, Program, ProgramLevel, ProgramLink, Room, TimeSlot};
use salas_util::{default_data_dir, parse_time, ParticipantId, DATABASE_FILENAME};
use std::collections::HashMap;
use std::path::PathBuf;

/// Validated configuration ready for use by the engine
#[derive(Debug, Clone, Default)]
pub struct Policy {
    /// Store configuration
    pub store: StoreConfig,

    /// Booking rules
    pub rules: Rules,

    /// Catalog seed (may be empty)
    pub catalog: Catalog,
}

impl Policy {
    /// Convert from raw config (after validation)
    pub fn from_raw(raw: RawConfig) -> Self {
        Self {
            store: StoreConfig::from_raw(raw.store),
            rules: Rules::from_raw(&raw.rules),
            catalog: convert_catalog(raw.catalog),
        }
    }
}

/// Where the reservation database lives
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub database: PathBuf,
}

impl StoreConfig {
    fn from_raw(raw: RawStoreConfig) -> Self {
        let database = raw.database.unwrap_or_else(|| {
            raw.data_dir
                .unwrap_or_else(default_data_dir)
                .join(DATABASE_FILENAME)
        });
        Self { database }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::from_raw(RawStoreConfig::default())
    }
}

/// Fair-use quotas and sanction length
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rules {
    /// Same-day open-room hours cap (inclusive)
    pub daily_quota: Duration,

    /// Active open-room bookings per ISO week; the next one is rejected
    pub weekly_active_limit: u32,

    /// Automatic sanction length in calendar months
    pub sanction_months: u32,
}

impl Rules {
    pub const DEFAULT_DAILY_QUOTA_MINUTES: u32 = 120;
    pub const DEFAULT_WEEKLY_ACTIVE_LIMIT: u32 = 3;
    pub const DEFAULT_SANCTION_MONTHS: u32 = 2;

    fn from_raw(raw: &RawRules) -> Self {
        let minutes = raw
            .daily_quota_minutes
            .unwrap_or(Self::DEFAULT_DAILY_QUOTA_MINUTES);

        Self {
            daily_quota: Duration::minutes(i64::from(minutes)),
            weekly_active_limit: raw
                .weekly_active_limit
                .unwrap_or(Self::DEFAULT_WEEKLY_ACTIVE_LIMIT),
            sanction_months: raw.sanction_months.unwrap_or(Self::DEFAULT_SANCTION_MONTHS),
        }
    }
}

impl Default for Rules {
    fn default() -> Self {
        Self::from_raw(&RawRules::default())
    }
}

// Conversion helpers. Records are already validated, so anything that
// fails to convert here was reported by `validate_config`.

fn convert_catalog(raw: RawCatalog) -> Catalog {
    let programs: Vec<Program> = raw
        .programs
        .into_iter()
        .filter_map(|p| {
            Some(Program {
                level: p.level.parse().ok()?,
                name: p.name,
            })
        })
        .collect();

    let levels: HashMap<&str, ProgramLevel> = programs
        .iter()
        .map(|p| (p.name.as_str(), p.level))
        .collect();

    let rooms = raw
        .rooms
        .into_iter()
        .filter_map(|r| {
            Some(Room {
                room_type: r.room_type.parse().ok()?,
                building: r.building,
                name: r.name,
                capacity: r.capacity,
            })
        })
        .collect();

    let slots = raw.slots.iter().filter_map(convert_slot).collect();

    let participants = raw
        .participants
        .iter()
        .filter_map(|p| convert_participant(p, &levels))
        .collect();

    Catalog {
        programs,
        rooms,
        slots,
        participants,
    }
}

fn convert_slot(raw: &RawSlot) -> Option<TimeSlot> {
    Some(TimeSlot {
        id: raw.id,
        start: parse_time(&raw.start).ok()?,
        end: parse_time(&raw.end).ok()?,
    })
}

fn convert_participant(
    raw: &RawParticipant,
    levels: &HashMap<&str, ProgramLevel>,
) -> Option<Participant> {
    let programs = raw
        .programs
        .iter()
        .filter_map(|link| {
            Some(ProgramLink {
                level: *levels.get(link.program.as_str())?,
                role: link.role.parse().ok()?,
                program: link.program.clone(),
            })
        })
        .collect();

    Some(Participant {
        id: ParticipantId::parse(&raw.id).ok()?,
        profile: raw.profile.parse().ok()?,
        programs,
    })
}
