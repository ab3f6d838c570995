//! Reservation engine

use chrono::NaiveDate;
use salas_api::{
    AdmissionRequest, AttendanceRequest, ErrorKind, NotFoundTarget, Reservation, ReservationState,
    Sanction, SlotAvailability,
};
use salas_config::Rules;
use salas_store::{AuditEvent, AuditEventType, ReservationFilter, Store, StoreTx};
use salas_util::{ParticipantId, ReservationId, RoomRef};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::lifecycle::record_sanction;
use crate::{admission, lifecycle, CoreError, CoreResult};

/// The reservation engine.
///
/// Stateless apart from its rules; every call opens its own store
/// transaction, so one engine can serve concurrent callers.
pub struct ReservationEngine {
    rules: Rules,
    store: Arc<dyn Store>,
}

impl ReservationEngine {
    /// Create a new engine
    pub fn new(rules: Rules, store: Arc<dyn Store>) -> Self {
        info!(
            daily_quota_minutes = rules.daily_quota.num_minutes(),
            weekly_active_limit = rules.weekly_active_limit,
            sanction_months = rules.sanction_months,
            "Reservation engine initialized"
        );

        Self { rules, store }
    }

    /// Run `f` in one transaction, committing on success.
    ///
    /// On error the transaction is dropped, which rolls back every write.
    fn with_transaction<T>(&self, f: impl FnOnce(&dyn StoreTx) -> CoreResult<T>) -> CoreResult<T> {
        let tx = self.store.begin()?;
        let value = f(tx.as_ref())?;
        tx.commit()?;
        Ok(value)
    }

    /// Run a read-only `f` in a deferred transaction
    fn read<T>(&self, f: impl FnOnce(&dyn StoreTx) -> CoreResult<T>) -> CoreResult<T> {
        let tx = self.store.begin_read()?;
        let value = f(tx.as_ref())?;
        tx.commit()?;
        Ok(value)
    }

    /// Decide on a booking request and persist it when accepted
    pub fn admit_reservation(&self, request: &AdmissionRequest) -> CoreResult<Reservation> {
        let result = self.with_transaction(|tx| {
            let reservation = admission::admit(tx, &self.rules, request)?;

            tx.append_audit(AuditEvent::new(AuditEventType::ReservationAdmitted {
                reservation_id: reservation.id,
                room: reservation.room.clone(),
                date: reservation.date,
                slot_id: reservation.slot_id,
                state: reservation.state,
                participants: reservation.participants().cloned().collect(),
            }))?;

            Ok(reservation)
        });

        match &result {
            Ok(reservation) => {
                info!(
                    reservation_id = %reservation.id,
                    room = %reservation.room,
                    date = %reservation.date,
                    slot_id = reservation.slot_id,
                    state = %reservation.state,
                    roster_size = reservation.roster.len(),
                    "Reservation admitted"
                );
            }
            Err(e) if e.kind() == ErrorKind::Internal => {
                error!(error = %e, "Admission failed");
            }
            Err(e) => {
                let room = RoomRef::new(request.building.as_str(), request.room.as_str());
                warn!(
                    room = %room,
                    date = %request.date,
                    slot_id = request.slot_id,
                    reason = %e,
                    "Admission denied"
                );

                // The transaction is gone; record the denial on its own
                if let Err(audit_err) =
                    self.store
                        .append_audit(AuditEvent::new(AuditEventType::AdmissionDenied {
                            room,
                            date: request.date,
                            slot_id: request.slot_id,
                            reason: e.to_string(),
                        }))
                {
                    warn!(error = %audit_err, "Failed to record admission denial");
                }
            }
        }

        result
    }

    /// Administrative status change
    pub fn change_state(&self, id: ReservationId, new_state: &str) -> CoreResult<Reservation> {
        let new_state: ReservationState = new_state
            .parse()
            .map_err(|e: salas_api::UnknownVariant| CoreError::Validation(e.to_string()))?;

        let transition = self.with_transaction(|tx| {
            let transition = lifecycle::change_state(tx, &self.rules, id, new_state)?;

            tx.append_audit(AuditEvent::new(AuditEventType::StateChanged {
                reservation_id: id,
                from: transition.previous,
                to: new_state,
            }))?;

            Ok(transition)
        })?;

        info!(
            reservation_id = %id,
            from = %transition.previous,
            to = %new_state,
            sanctions_issued = transition.issued.len(),
            "Reservation state changed"
        );

        Ok(transition.reservation)
    }

    /// Record who attended a reservation and resolve its outcome
    pub fn record_attendance(
        &self,
        id: ReservationId,
        request: &AttendanceRequest,
    ) -> CoreResult<Reservation> {
        let transition = self.with_transaction(|tx| {
            let transition = lifecycle::record_attendance(tx, &self.rules, id, request)?;

            let attended = transition.reservation.attended_count();
            tx.append_audit(AuditEvent::new(AuditEventType::AttendanceRecorded {
                reservation_id: id,
                attended,
                absent: transition.reservation.roster.len() - attended,
                state: transition.reservation.state,
            }))?;

            Ok(transition)
        })?;

        info!(
            reservation_id = %id,
            attended = transition.reservation.attended_count(),
            state = %transition.reservation.state,
            sanctions_issued = transition.issued.len(),
            "Attendance recorded"
        );

        Ok(transition.reservation)
    }

    /// Every time slot of a room on a date, with the reservation holding it.
    ///
    /// Cancelled reservations still hold their slot.
    pub fn availability(
        &self,
        building: &str,
        room: &str,
        date: NaiveDate,
    ) -> CoreResult<Vec<SlotAvailability>> {
        let room_ref = RoomRef::new(building, room);

        self.read(|tx| {
            if tx.get_room(&room_ref)?.is_none() {
                return Err(CoreError::NotFound(NotFoundTarget::Room {
                    room: room_ref.clone(),
                }));
            }

            let occupancy = tx.slot_occupancy(&room_ref, date)?;
            let slots = tx.list_time_slots()?;

            debug!(
                room = %room_ref,
                date = %date,
                reserved = occupancy.len(),
                "Availability computed"
            );

            Ok(slots
                .into_iter()
                .map(|slot| {
                    let held = occupancy.get(&slot.id);
                    SlotAvailability {
                        reserved: held.is_some(),
                        reservation_id: held.map(|(id, _)| *id),
                        state: held.map(|(_, state)| *state),
                        slot,
                    }
                })
                .collect())
        })
    }

    /// Reservations matching a filter
    pub fn list_reservations(&self, filter: &ReservationFilter) -> CoreResult<Vec<Reservation>> {
        self.read(|tx| Ok(tx.find_reservations(filter)?))
    }

    /// Load one reservation with its roster
    pub fn get_reservation(&self, id: ReservationId) -> CoreResult<Reservation> {
        self.read(|tx| {
            tx.get_reservation(id)?
                .ok_or(CoreError::NotFound(NotFoundTarget::Reservation { id }))
        })
    }

    /// Every sanction of a participant, newest first
    pub fn sanctions_for(&self, participant: &str) -> CoreResult<Vec<Sanction>> {
        let participant = ParticipantId::parse(participant)?;
        self.read(|tx| Ok(tx.sanctions_for(&participant)?))
    }

    /// Manual sanction entry.
    ///
    /// Returns the sanction on record for (participant, start): the new one,
    /// or the existing one left untouched.
    pub fn issue_manual_sanction(
        &self,
        participant: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> CoreResult<Sanction> {
        let participant = ParticipantId::parse(participant)?;
        if end <= start {
            return Err(CoreError::Validation(format!(
                "sanction must end after it starts ({} to {})",
                start, end
            )));
        }

        self.with_transaction(|tx| {
            if tx.get_participants(std::slice::from_ref(&participant))?.is_empty() {
                return Err(CoreError::NotFound(NotFoundTarget::Participants {
                    ids: vec![participant.clone()],
                }));
            }

            let sanction = Sanction {
                participant: participant.clone(),
                start,
                end,
            };
            if let Some(issued) = record_sanction(tx, &sanction, None)? {
                return Ok(issued);
            }

            tx.sanctions_for(&participant)?
                .into_iter()
                .find(|s| s.start == start)
                .ok_or_else(|| CoreError::Internal("sanction vanished after upsert".into()))
        })
    }

    /// Whether the store answers
    pub fn health(&self) -> bool {
        self.store.is_healthy()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;

    fn make_engine() -> (ReservationEngine, Arc<dyn Store>) {
        let store: Arc<dyn Store> = Arc::new(seeded_store());
        (ReservationEngine::new(Rules::default(), store.clone()), store)
    }

    fn lab_request(slot_id: i64, ids: &[&str]) -> AdmissionRequest {
        AdmissionRequest::new(
            "Central",
            "Lab-1",
            date("2024-03-04"),
            slot_id,
            ids.iter().copied(),
        )
    }

    #[test]
    fn test_admission_is_audited() {
        let (engine, store) = make_engine();

        engine.admit_reservation(&lab_request(1, &[STUDENT])).unwrap();
        let events = store.get_recent_audits(1).unwrap();
        assert!(matches!(
            events[0].event,
            AuditEventType::ReservationAdmitted { slot_id: 1, .. }
        ));

        engine.admit_reservation(&lab_request(1, &[OTHER_STUDENT])).unwrap_err();
        let events = store.get_recent_audits(1).unwrap();
        assert!(matches!(
            events[0].event,
            AuditEventType::AdmissionDenied { slot_id: 1, .. }
        ));
    }

    #[test]
    fn test_rejected_admission_leaves_nothing_behind() {
        let (engine, _) = make_engine();

        let err = engine
            .admit_reservation(&lab_request(1, &[STUDENT, OTHER_STUDENT, FACULTY]))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert!(engine.list_reservations(&ReservationFilter::new()).unwrap().is_empty());
    }

    #[test]
    fn test_change_state_validates_name() {
        let (engine, _) = make_engine();
        let r = engine.admit_reservation(&lab_request(1, &[STUDENT])).unwrap();

        let err = engine.change_state(r.id, "postponed").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let updated = engine.change_state(r.id, "cancelled").unwrap();
        assert_eq!(updated.state, ReservationState::Cancelled);
        assert_eq!(engine.get_reservation(r.id).unwrap().state, ReservationState::Cancelled);
    }

    #[test]
    fn test_availability() {
        let (engine, _) = make_engine();
        let r = engine.admit_reservation(&lab_request(2, &[STUDENT])).unwrap();
        engine.change_state(r.id, "cancelled").unwrap();

        let slots = engine.availability("Central", "Lab-1", date("2024-03-04")).unwrap();
        assert_eq!(slots.len(), 5);
        assert!(!slots[0].reserved);
        assert!(slots[1].reserved);
        assert_eq!(slots[1].reservation_id, Some(r.id));
        assert_eq!(slots[1].state, Some(ReservationState::Cancelled));

        let err = engine.availability("Central", "Attic", date("2024-03-04")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_manual_sanction() {
        let (engine, _) = make_engine();

        let s = engine
            .issue_manual_sanction(STUDENT, date("2024-03-01"), date("2024-04-01"))
            .unwrap();
        assert_eq!(s.end, date("2024-04-01"));

        // Same start keeps the original window
        let again = engine
            .issue_manual_sanction(STUDENT, date("2024-03-01"), date("2024-09-01"))
            .unwrap();
        assert_eq!(again, s);
        assert_eq!(engine.sanctions_for(STUDENT).unwrap(), vec![s]);

        let err = engine
            .issue_manual_sanction(STUDENT, date("2024-03-01"), date("2024-03-01"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err = engine
            .issue_manual_sanction("9999999", date("2024-03-01"), date("2024-04-01"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let err = engine.admit_reservation(&lab_request(1, &[STUDENT])).unwrap_err();
        assert!(matches!(err.conflict(), Some(salas_api::ConflictReason::Sanctioned { .. })));
    }

    #[test]
    fn test_health() {
        let (engine, _) = make_engine();
        assert!(engine.health());
    }
}
