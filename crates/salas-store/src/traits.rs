//! Store trait definitions

use chrono::NaiveDate;
use salas_api::{Catalog, Participant, Reservation, ReservationState, Room, Sanction, TimeSlot};
use salas_util::{ParticipantId, ReservationId, RoomRef};
use std::collections::HashMap;

use crate::{AuditEvent, QuotaQuery, QuotaRow, ReservationFilter, StoreResult};

/// Read-only catalog access
pub trait CatalogReader {
    /// Look up a room by building and name
    fn get_room(&self, room: &RoomRef) -> StoreResult<Option<Room>>;

    /// Look up a time slot
    fn get_time_slot(&self, id: i64) -> StoreResult<Option<TimeSlot>>;

    /// Every time slot, ordered by id
    fn list_time_slots(&self) -> StoreResult<Vec<TimeSlot>>;

    /// Resolve participants; unknown ids are simply absent from the map
    fn get_participants(
        &self,
        ids: &[ParticipantId],
    ) -> StoreResult<HashMap<ParticipantId, Participant>>;
}

/// Fields of a reservation about to be inserted
#[derive(Debug, Clone)]
pub struct NewReservation {
    pub room: RoomRef,
    pub date: NaiveDate,
    pub slot_id: i64,
    pub state: ReservationState,
    pub roster: Vec<ParticipantId>,
}

/// Reservation and roster persistence
pub trait ReservationRepo {
    /// Insert a reservation and its roster.
    ///
    /// Fails with `StoreError::UniqueViolation` when the (room, date, slot)
    /// triple is already taken.
    fn insert_reservation(&self, new: &NewReservation) -> StoreResult<Reservation>;

    /// Load a reservation with its roster
    fn get_reservation(&self, id: ReservationId) -> StoreResult<Option<Reservation>>;

    /// Overwrite a reservation's state
    fn set_state(&self, id: ReservationId, state: ReservationState) -> StoreResult<()>;

    /// Mark every roster member absent, then the given ones present
    fn set_attendance(&self, id: ReservationId, present: &[ParticipantId]) -> StoreResult<()>;

    /// Reservations of one participant for quota accounting
    fn quota_rows(&self, query: &QuotaQuery) -> StoreResult<Vec<QuotaRow>>;

    /// Reservations matching a filter, ordered by date, slot and id
    fn find_reservations(&self, filter: &ReservationFilter) -> StoreResult<Vec<Reservation>>;

    /// Reservation id and state per occupied slot of a room on a date
    fn slot_occupancy(
        &self,
        room: &RoomRef,
        date: NaiveDate,
    ) -> StoreResult<HashMap<i64, (ReservationId, ReservationState)>>;
}

/// Sanction ledger
pub trait SanctionLedger {
    /// A sanction of this participant covering `date`, if any
    fn find_active(&self, participant: &ParticipantId, date: NaiveDate)
        -> StoreResult<Option<Sanction>>;

    /// Insert unless a sanction with the same (participant, start) exists.
    /// Returns whether a row was written.
    fn upsert_ignore_existing(&self, sanction: &Sanction) -> StoreResult<bool>;

    /// Every sanction of a participant, newest first
    fn sanctions_for(&self, participant: &ParticipantId) -> StoreResult<Vec<Sanction>>;
}

/// One strict-isolation transaction.
///
/// Dropping it without `commit` rolls back every write made through it.
pub trait StoreTx: CatalogReader + ReservationRepo + SanctionLedger {
    /// Append an audit event as part of this transaction
    fn append_audit(&self, event: AuditEvent) -> StoreResult<()>;

    /// Commit all writes atomically
    fn commit(self: Box<Self>) -> StoreResult<()>;
}

/// Main store trait
pub trait Store: Send + Sync {
    /// Start a transaction; it holds the write lock until committed or dropped
    fn begin(&self) -> StoreResult<Box<dyn StoreTx + '_>>;

    /// Start a read transaction; it takes no write lock unless it writes
    fn begin_read(&self) -> StoreResult<Box<dyn StoreTx + '_>>;

    // Audit log

    /// Append an audit event outside any transaction
    fn append_audit(&self, event: AuditEvent) -> StoreResult<()>;

    /// Get recent audit events
    fn get_recent_audits(&self, limit: usize) -> StoreResult<Vec<AuditEvent>>;

    // Catalog

    /// Upsert catalog records
    fn seed_catalog(&self, catalog: &Catalog) -> StoreResult<()>;

    // Health

    /// Check if store is healthy
    fn is_healthy(&self) -> bool;
}
