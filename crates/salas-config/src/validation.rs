//! Configuration validation

use crate::schema::{RawCatalog, RawConfig, RawParticipant, RawRoom, RawRules, RawSlot};
use salas_api::{ProfileType, ProgramLevel, ProgramRole, RoomType};
use salas_util::{parse_time, ParticipantId};
use std::collections::HashSet;
use thiserror::Error;

/// Validation error
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    #[error("Rule '{rule}': {message}")]
    RuleError { rule: String, message: String },

    #[error("Room '{room}': {message}")]
    RoomError { room: String, message: String },

    #[error("Slot {slot_id}: {message}")]
    SlotError { slot_id: i64, message: String },

    #[error("Program '{program}': {message}")]
    ProgramError { program: String, message: String },

    #[error("Participant '{participant}': {message}")]
    ParticipantError { participant: String, message: String },

    #[error("Invalid time format '{value}': {message}")]
    InvalidTimeFormat { value: String, message: String },

    #[error("Duplicate {kind}: {key}")]
    Duplicate { kind: &'static str, key: String },
}

/// Validate a raw configuration
pub fn validate_config(config: &RawConfig) -> Vec<ValidationError> {
    let mut errors = validate_rules(&config.rules);
    errors.extend(validate_catalog(&config.catalog));
    errors
}

fn validate_rules(rules: &RawRules) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    let limits = [
        ("daily_quota_minutes", rules.daily_quota_minutes),
        ("weekly_active_limit", rules.weekly_active_limit),
        ("sanction_months", rules.sanction_months),
    ];

    for (rule, value) in limits {
        if value == Some(0) {
            errors.push(ValidationError::RuleError {
                rule: rule.to_string(),
                message: "must be greater than zero".into(),
            });
        }
    }

    errors
}

fn validate_catalog(catalog: &RawCatalog) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    let mut programs = HashSet::new();
    for program in &catalog.programs {
        if !programs.insert(program.name.as_str()) {
            errors.push(ValidationError::Duplicate {
                kind: "program",
                key: program.name.clone(),
            });
        }
        if program.level.parse::<ProgramLevel>().is_err() {
            errors.push(ValidationError::ProgramError {
                program: program.name.clone(),
                message: format!("unknown level '{}'", program.level),
            });
        }
    }

    let mut rooms = HashSet::new();
    for room in &catalog.rooms {
        if !rooms.insert((room.building.as_str(), room.name.as_str())) {
            errors.push(ValidationError::Duplicate {
                kind: "room",
                key: format!("{}/{}", room.building, room.name),
            });
        }
        errors.extend(validate_room(room));
    }

    let mut slots = HashSet::new();
    for slot in &catalog.slots {
        if !slots.insert(slot.id) {
            errors.push(ValidationError::Duplicate {
                kind: "slot",
                key: slot.id.to_string(),
            });
        }
        errors.extend(validate_slot(slot));
    }

    let mut participants = HashSet::new();
    for participant in &catalog.participants {
        if let Ok(id) = ParticipantId::parse(&participant.id) {
            if !participants.insert(id.clone()) {
                errors.push(ValidationError::Duplicate {
                    kind: "participant",
                    key: id.to_string(),
                });
            }
        }
        errors.extend(validate_participant(participant, &programs));
    }

    errors
}

fn validate_room(room: &RawRoom) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let key = format!("{}/{}", room.building, room.name);

    if room.building.trim().is_empty() || room.name.trim().is_empty() {
        errors.push(ValidationError::RoomError {
            room: key.clone(),
            message: "building and name cannot be empty".into(),
        });
    }

    if room.capacity == 0 {
        errors.push(ValidationError::RoomError {
            room: key.clone(),
            message: "capacity must be positive".into(),
        });
    }

    if room.room_type.parse::<RoomType>().is_err() {
        errors.push(ValidationError::RoomError {
            room: key,
            message: format!("unknown room type '{}'", room.room_type),
        });
    }

    errors
}

fn validate_slot(slot: &RawSlot) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    let start = parse_time(&slot.start);
    let end = parse_time(&slot.end);

    if let Err(e) = &start {
        errors.push(ValidationError::InvalidTimeFormat {
            value: slot.start.clone(),
            message: e.to_string(),
        });
    }
    if let Err(e) = &end {
        errors.push(ValidationError::InvalidTimeFormat {
            value: slot.end.clone(),
            message: e.to_string(),
        });
    }

    if let (Ok(start), Ok(end)) = (start, end)
        && end <= start
    {
        errors.push(ValidationError::SlotError {
            slot_id: slot.id,
            message: format!("end {} must be after start {}", slot.end, slot.start),
        });
    }

    errors
}

fn validate_participant(
    participant: &RawParticipant,
    programs: &HashSet<&str>,
) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if let Err(e) = ParticipantId::parse(&participant.id) {
        errors.push(ValidationError::ParticipantError {
            participant: participant.id.clone(),
            message: e.to_string(),
        });
    }

    if participant.profile.parse::<ProfileType>().is_err() {
        errors.push(ValidationError::ParticipantError {
            participant: participant.id.clone(),
            message: format!("unknown profile '{}'", participant.profile),
        });
    }

    for link in &participant.programs {
        if !programs.contains(link.program.as_str()) {
            errors.push(ValidationError::ParticipantError {
                participant: participant.id.clone(),
                message: format!("links to undeclared program '{}'", link.program),
            });
        }
        if link.role.parse::<ProgramRole>().is_err() {
            errors.push(ValidationError::ParticipantError {
                participant: participant.id.clone(),
                message: format!("unknown role '{}'", link.role),
            });
        }
    }

    errors
}
