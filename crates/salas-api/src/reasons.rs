//! Structured reasons a request was refused

use chrono::NaiveDate;
use salas_util::{ParticipantId, ReservationId, RoomRef};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{RoomType, Sanction};

/// Coarse classification of every engine failure.
///
/// Bindings map these to their own vocabulary (HTTP 404/422/409/500,
/// process exit codes, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    Validation,
    Conflict,
    Internal,
}

/// What could not be found
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "target", rename_all = "snake_case")]
pub enum NotFoundTarget {
    Room { room: RoomRef },
    TimeSlot { slot_id: i64 },
    Participants { ids: Vec<ParticipantId> },
    Reservation { id: ReservationId },
}

impl fmt::Display for NotFoundTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotFoundTarget::Room { room } => write!(f, "room {} not found", room),
            NotFoundTarget::TimeSlot { slot_id } => write!(f, "time slot {} not found", slot_id),
            NotFoundTarget::Participants { ids } => {
                write!(f, "participants not found: {}", join(ids))
            }
            NotFoundTarget::Reservation { id } => write!(f, "reservation {} not found", id),
        }
    }
}

/// Business rule that rejected a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum ConflictReason {
    /// Some roster members are not eligible for the room type
    Exclusivity {
        room_type: RoomType,
        ineligible: Vec<ParticipantId>,
    },

    /// Roster larger than the room
    CapacityExceeded { capacity: u32, requested: usize },

    /// Roster members under an active sanction on the booking date
    Sanctioned { sanctions: Vec<Sanction> },

    /// Same-day open-room hours would exceed the cap
    DailyQuotaExceeded {
        participant: ParticipantId,
        booked_minutes: i64,
        requested_minutes: i64,
        limit_minutes: i64,
    },

    /// Too many active open-room bookings in the ISO week
    WeeklyQuotaExceeded {
        participant: ParticipantId,
        active_count: u32,
        limit: u32,
    },

    /// The (room, date, slot) triple already has a reservation
    SlotAlreadyBooked {
        room: RoomRef,
        date: NaiveDate,
        slot_id: i64,
    },
}

impl fmt::Display for ConflictReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConflictReason::Exclusivity {
                room_type,
                ineligible,
            } => {
                let needs = match room_type {
                    RoomType::FacultyOnly => "faculty eligibility",
                    RoomType::GradOnly => "grad or faculty eligibility",
                    RoomType::Open => "no eligibility",
                };
                write!(
                    f,
                    "{} room requires {}; ineligible: {}",
                    room_type,
                    needs,
                    join(ineligible)
                )
            }
            ConflictReason::CapacityExceeded {
                capacity,
                requested,
            } => write!(
                f,
                "capacity exceeded: {} participants for a room of {}",
                requested, capacity
            ),
            ConflictReason::Sanctioned { sanctions } => {
                f.write_str("participants with an active sanction: ")?;
                for (i, s) in sanctions.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{} ({} to {})", s.participant, s.start, s.end)?;
                }
                Ok(())
            }
            ConflictReason::DailyQuotaExceeded {
                participant,
                booked_minutes,
                requested_minutes,
                limit_minutes,
            } => write!(
                f,
                "daily quota exceeded for {}: {:.1} + {:.1} > {:.1} hours",
                participant,
                minutes_as_hours(*booked_minutes),
                minutes_as_hours(*requested_minutes),
                minutes_as_hours(*limit_minutes)
            ),
            ConflictReason::WeeklyQuotaExceeded {
                participant,
                active_count,
                limit,
            } => write!(
                f,
                "weekly quota exceeded for {}: {} booking rejected, {} active this week, limit {}",
                participant,
                ordinal(active_count + 1),
                active_count,
                limit
            ),
            ConflictReason::SlotAlreadyBooked {
                room,
                date,
                slot_id,
            } => write!(
                f,
                "slot already booked: {} on {} slot {}",
                room, date, slot_id
            ),
        }
    }
}

fn minutes_as_hours(minutes: i64) -> f64 {
    minutes as f64 / 60.0
}

fn join(ids: &[ParticipantId]) -> String {
    ids.iter()
        .map(ParticipantId::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// English ordinal: 1st, 2nd, 3rd, 4th, 11th, 21st
fn ordinal(n: u32) -> String {
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{}{}", n, suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pid(s: &str) -> ParticipantId {
        ParticipantId::parse(s).unwrap()
    }

    #[test]
    fn daily_quota_message_shows_hours() {
        let reason = ConflictReason::DailyQuotaExceeded {
            participant: pid("1234567"),
            booked_minutes: 60,
            requested_minutes: 90,
            limit_minutes: 120,
        };
        assert_eq!(
            reason.to_string(),
            "daily quota exceeded for 1234567: 1.0 + 1.5 > 2.0 hours"
        );
    }

    #[test]
    fn weekly_message_names_refused_booking() {
        let reason = ConflictReason::WeeklyQuotaExceeded {
            participant: pid("1234567"),
            active_count: 3,
            limit: 3,
        };
        assert_eq!(
            reason.to_string(),
            "weekly quota exceeded for 1234567: 4th booking rejected, 3 active this week, limit 3"
        );
    }

    #[test]
    fn ordinals() {
        let got: Vec<String> = [1, 2, 3, 4, 11, 12, 13, 21, 22, 111].map(ordinal).to_vec();
        assert_eq!(
            got,
            ["1st", "2nd", "3rd", "4th", "11th", "12th", "13th", "21st", "22nd", "111th"]
        );
    }

    #[test]
    fn exclusivity_message_names_participants() {
        let reason = ConflictReason::Exclusivity {
            room_type: RoomType::GradOnly,
            ineligible: vec![pid("1234567"), pid("7654321")],
        };
        let msg = reason.to_string();
        assert!(msg.contains("grad or faculty"));
        assert!(msg.contains("1234567, 7654321"));
    }

    #[test]
    fn conflict_serializes_with_rule_tag() {
        let reason = ConflictReason::WeeklyQuotaExceeded {
            participant: pid("1234567"),
            active_count: 3,
            limit: 3,
        };
        let json = serde_json::to_value(&reason).unwrap();
        assert_eq!(json["rule"], "weekly_quota_exceeded");
        assert_eq!(json["participant"], "1234567");
    }
}
