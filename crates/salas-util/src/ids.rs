//! Strongly-typed identifiers for salas

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{UtilError, UtilResult};

/// Normalized national-ID of a participant (7 or 8 ASCII digits)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ParticipantId(String);

impl ParticipantId {
    /// Normalize a raw identifier.
    ///
    /// Dots, dashes and whitespace are stripped (`4.123.456-7` becomes
    /// `41234567`); whatever remains must be 7 or 8 digits.
    pub fn parse(raw: &str) -> UtilResult<Self> {
        let normalized: String = raw
            .chars()
            .filter(|c| !matches!(c, '.' | '-') && !c.is_whitespace())
            .collect();

        let valid = (7..=8).contains(&normalized.len())
            && normalized.chars().all(|c| c.is_ascii_digit());

        if valid {
            Ok(Self(normalized))
        } else {
            Err(UtilError::InvalidParticipantId(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for ParticipantId {
    type Error = UtilError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<ParticipantId> for String {
    fn from(id: ParticipantId) -> Self {
        id.0
    }
}

impl std::str::FromStr for ParticipantId {
    type Err = UtilError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Store-generated identifier of a reservation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReservationId(i64);

impl ReservationId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn get(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for ReservationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A room is identified by its name within a building
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RoomRef {
    pub building: String,
    pub name: String,
}

impl RoomRef {
    pub fn new(building: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            building: building.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for RoomRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.building, self.name)
    }
}
