//! Requests accepted by the engine
//!
//! Identifiers and state names arrive as raw strings; the engine
//! normalizes them and reports malformed input as validation failures.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Proposed booking
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdmissionRequest {
    pub building: String,
    pub room: String,
    pub date: NaiveDate,
    pub slot_id: i64,
    pub participants: Vec<String>,
    /// Requested initial state; `active` when absent
    #[serde(default)]
    pub state: Option<String>,
}

impl AdmissionRequest {
    pub fn new(
        building: impl Into<String>,
        room: impl Into<String>,
        date: NaiveDate,
        slot_id: i64,
        participants: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            building: building.into(),
            room: room.into(),
            date,
            slot_id,
            participants: participants.into_iter().map(Into::into).collect(),
            state: None,
        }
    }

    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }
}

/// Attendance taken for a reservation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceRequest {
    /// Roster members who showed up
    #[serde(default)]
    pub present: Vec<String>,

    /// Sanction absentees when nobody showed up
    #[serde(default = "default_sanction_absentees")]
    pub sanction_absentees: bool,
}

impl AttendanceRequest {
    pub fn new(present: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            present: present.into_iter().map(Into::into).collect(),
            sanction_absentees: true,
        }
    }
}

fn default_sanction_absentees() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attendance_defaults_to_sanctioning() {
        let req: AttendanceRequest = serde_json::from_str("{}").unwrap();
        assert!(req.present.is_empty());
        assert!(req.sanction_absentees);
    }

    #[test]
    fn admission_state_defaults_to_none() {
        let req: AdmissionRequest = serde_json::from_str(
            r#"{"building":"Central","room":"Lab-1","date":"2024-03-04","slot_id":1,"participants":["1234567"]}"#,
        )
        .unwrap();
        assert!(req.state.is_none());
        assert_eq!(req.participants, vec!["1234567".to_string()]);
    }
}
