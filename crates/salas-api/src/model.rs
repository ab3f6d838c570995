//! Catalog and reservation records

use chrono::{Duration, NaiveDate, NaiveTime};
use salas_util::{ParticipantId, ReservationId, RoomRef};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// An enum value read from text that matched none of its variants
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown {kind} '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl UnknownVariant {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// Who a room is reserved for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomType {
    /// No exclusivity; subject to fair-use quotas
    Open,
    /// Grad-eligible or faculty-eligible participants only
    GradOnly,
    /// Faculty-eligible participants only
    FacultyOnly,
}

impl RoomType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoomType::Open => "open",
            RoomType::GradOnly => "grad_only",
            RoomType::FacultyOnly => "faculty_only",
        }
    }
}

impl FromStr for RoomType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(RoomType::Open),
            "grad_only" | "grad-only" => Ok(RoomType::GradOnly),
            "faculty_only" | "faculty-only" => Ok(RoomType::FacultyOnly),
            other => Err(UnknownVariant::new("room type", other)),
        }
    }
}

impl fmt::Display for RoomType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A bookable room
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub building: String,
    pub name: String,
    pub capacity: u32,
    pub room_type: RoomType,
}

impl Room {
    pub fn room_ref(&self) -> RoomRef {
        RoomRef::new(&self.building, &self.name)
    }
}

/// A fixed daily time slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub id: i64,
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl TimeSlot {
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}

/// Profile a participant registered with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileType {
    Student,
    Faculty,
    GradStudent,
}

impl ProfileType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileType::Student => "student",
            ProfileType::Faculty => "faculty",
            ProfileType::GradStudent => "grad_student",
        }
    }
}

impl FromStr for ProfileType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(ProfileType::Student),
            "faculty" => Ok(ProfileType::Faculty),
            "grad_student" | "grad-student" => Ok(ProfileType::GradStudent),
            other => Err(UnknownVariant::new("profile type", other)),
        }
    }
}

/// Academic level of a program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgramLevel {
    Undergrad,
    Grad,
}

impl ProgramLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProgramLevel::Undergrad => "undergrad",
            ProgramLevel::Grad => "grad",
        }
    }
}

impl FromStr for ProgramLevel {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "undergrad" => Ok(ProgramLevel::Undergrad),
            "grad" => Ok(ProgramLevel::Grad),
            other => Err(UnknownVariant::new("program level", other)),
        }
    }
}

/// Role a participant holds within a program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgramRole {
    Student,
    Faculty,
}

impl ProgramRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProgramRole::Student => "student",
            ProgramRole::Faculty => "faculty",
        }
    }
}

impl FromStr for ProgramRole {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(ProgramRole::Student),
            "faculty" => Ok(ProgramRole::Faculty),
            other => Err(UnknownVariant::new("program role", other)),
        }
    }
}

/// Link between a participant and an academic program
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramLink {
    pub program: String,
    pub level: ProgramLevel,
    pub role: ProgramRole,
}

/// A registered participant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub profile: ProfileType,
    #[serde(default)]
    pub programs: Vec<ProgramLink>,
}

impl Participant {
    /// Grad-student profile, or enrolled in any grad-level program
    pub fn is_grad_eligible(&self) -> bool {
        self.profile == ProfileType::GradStudent
            || self.programs.iter().any(|p| p.level == ProgramLevel::Grad)
    }

    /// Faculty profile, or holding a faculty role in any program
    pub fn is_faculty_eligible(&self) -> bool {
        self.profile == ProfileType::Faculty
            || self.programs.iter().any(|p| p.role == ProgramRole::Faculty)
    }

    /// Whether this participant may be on the roster of a room of this type.
    /// Faculty may also use grad rooms.
    pub fn may_use(&self, room_type: RoomType) -> bool {
        match room_type {
            RoomType::Open => true,
            RoomType::GradOnly => self.is_grad_eligible() || self.is_faculty_eligible(),
            RoomType::FacultyOnly => self.is_faculty_eligible(),
        }
    }
}

/// An academic program
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    pub name: String,
    pub level: ProgramLevel,
}

/// Catalog records loaded into the store ahead of any booking
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    pub programs: Vec<Program>,
    pub rooms: Vec<Room>,
    pub slots: Vec<TimeSlot>,
    pub participants: Vec<Participant>,
}

impl Catalog {
    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
            && self.rooms.is_empty()
            && self.slots.is_empty()
            && self.participants.is_empty()
    }
}

/// Reservation lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReservationState {
    Active,
    Cancelled,
    NoShow,
    Completed,
}

impl ReservationState {
    pub const ALL: [ReservationState; 4] = [
        ReservationState::Active,
        ReservationState::Cancelled,
        ReservationState::NoShow,
        ReservationState::Completed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationState::Active => "active",
            ReservationState::Cancelled => "cancelled",
            ReservationState::NoShow => "no_show",
            ReservationState::Completed => "completed",
        }
    }
}

impl FromStr for ReservationState {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "active" => Ok(ReservationState::Active),
            "cancelled" => Ok(ReservationState::Cancelled),
            "no_show" | "no-show" => Ok(ReservationState::NoShow),
            "completed" => Ok(ReservationState::Completed),
            other => Err(UnknownVariant::new("reservation state", other)),
        }
    }
}

impl fmt::Display for ReservationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One participant on a reservation roster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub participant: ParticipantId,
    /// `None` until attendance is recorded
    pub attended: Option<bool>,
}

/// A room booking for one slot on one date
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: ReservationId,
    pub room: RoomRef,
    pub date: NaiveDate,
    pub slot_id: i64,
    pub state: ReservationState,
    pub roster: Vec<RosterEntry>,
}

impl Reservation {
    pub fn participants(&self) -> impl Iterator<Item = &ParticipantId> {
        self.roster.iter().map(|r| &r.participant)
    }

    pub fn has_participant(&self, id: &ParticipantId) -> bool {
        self.roster.iter().any(|r| &r.participant == id)
    }

    pub fn attended_count(&self) -> usize {
        self.roster.iter().filter(|r| r.attended == Some(true)).count()
    }
}

/// A period during which a participant may not join new active reservations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sanction {
    pub participant: ParticipantId,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Sanction {
    /// Closed-interval coverage check
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Occupancy of one slot of a room on a date
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotAvailability {
    pub slot: TimeSlot,
    pub reserved: bool,
    pub reservation_id: Option<ReservationId>,
    pub state: Option<ReservationState>,
}
