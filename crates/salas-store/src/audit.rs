//! Audit event types

use chrono::{DateTime, Local, NaiveDate};
use salas_api::ReservationState;
use salas_util::{ParticipantId, ReservationId, RoomRef};
use serde::{Deserialize, Serialize};

/// Types of audit events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuditEventType {
    /// Schema migrated at open
    SchemaMigrated { from_version: u32, to_version: u32 },

    /// Catalog records loaded
    CatalogSeeded {
        rooms: usize,
        slots: usize,
        participants: usize,
    },

    /// Reservation accepted and persisted
    ReservationAdmitted {
        reservation_id: ReservationId,
        room: RoomRef,
        date: NaiveDate,
        slot_id: i64,
        state: ReservationState,
        participants: Vec<ParticipantId>,
    },

    /// Booking request rejected
    AdmissionDenied {
        room: RoomRef,
        date: NaiveDate,
        slot_id: i64,
        reason: String,
    },

    /// Administrative status change
    StateChanged {
        reservation_id: ReservationId,
        from: ReservationState,
        to: ReservationState,
    },

    /// Attendance taken
    AttendanceRecorded {
        reservation_id: ReservationId,
        attended: usize,
        absent: usize,
        state: ReservationState,
    },

    /// Sanction written to the ledger
    SanctionIssued {
        participant: ParticipantId,
        start: NaiveDate,
        end: NaiveDate,
        /// Reservation that triggered it; `None` for manual entries
        reservation_id: Option<ReservationId>,
    },
}

/// Full audit event with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Unique event ID
    pub id: i64,

    /// Event timestamp
    pub timestamp: DateTime<Local>,

    /// Event type and details
    pub event: AuditEventType,
}

impl AuditEvent {
    pub fn new(event: AuditEventType) -> Self {
        Self {
            id: 0, // Will be set by store
            timestamp: Local::now(),
            event,
        }
    }
}
