//! Admission control for new bookings
//!
//! Checks run in a fixed order and the first failure rejects the request:
//!
//! 1. room exists
//! 2. time slot exists
//! 3. requested state is a known state
//! 4. roster is non-empty and every participant is registered
//! 5. room-type exclusivity
//! 6. capacity
//! 7. for `active` bookings only: sanctions, then quotas (open rooms)
//! 8. (room, date, slot) uniqueness, enforced by the insert itself

use salas_api::{
    AdmissionRequest, ConflictReason, NotFoundTarget, Reservation, ReservationState, RoomType,
};
use salas_config::Rules;
use salas_store::{NewReservation, StoreError, StoreTx};
use salas_util::{ParticipantId, RoomRef};
use tracing::debug;

use crate::{check_quota, sanctioned_among, CoreError, CoreResult};

/// Run every admission check inside `tx` and persist the reservation.
///
/// The caller commits `tx`; on error nothing has been written.
pub fn admit(
    tx: &dyn StoreTx,
    rules: &Rules,
    request: &AdmissionRequest,
) -> CoreResult<Reservation> {
    let room_ref = RoomRef::new(request.building.as_str(), request.room.as_str());

    let room = tx
        .get_room(&room_ref)?
        .ok_or_else(|| CoreError::NotFound(NotFoundTarget::Room {
            room: room_ref.clone(),
        }))?;

    let slot = tx
        .get_time_slot(request.slot_id)?
        .ok_or(CoreError::NotFound(NotFoundTarget::TimeSlot {
            slot_id: request.slot_id,
        }))?;

    let state = requested_state(request.state.as_deref())?;

    let roster = normalize_ids(&request.participants)?;
    if roster.is_empty() {
        return Err(CoreError::Validation("participant list is empty".into()));
    }

    let participants = tx.get_participants(&roster)?;
    let missing: Vec<ParticipantId> = roster
        .iter()
        .filter(|id| !participants.contains_key(*id))
        .cloned()
        .collect();
    if !missing.is_empty() {
        return Err(CoreError::NotFound(NotFoundTarget::Participants {
            ids: missing,
        }));
    }

    let ineligible: Vec<ParticipantId> = roster
        .iter()
        .filter(|id| {
            participants
                .get(*id)
                .is_some_and(|p| !p.may_use(room.room_type))
        })
        .cloned()
        .collect();
    if !ineligible.is_empty() {
        return Err(CoreError::Conflict(ConflictReason::Exclusivity {
            room_type: room.room_type,
            ineligible,
        }));
    }

    if roster.len() > room.capacity as usize {
        return Err(CoreError::Conflict(ConflictReason::CapacityExceeded {
            capacity: room.capacity,
            requested: roster.len(),
        }));
    }

    if state == ReservationState::Active {
        let sanctions = sanctioned_among(tx, &roster, request.date)?;
        if !sanctions.is_empty() {
            return Err(CoreError::Conflict(ConflictReason::Sanctioned { sanctions }));
        }

        if room.room_type == RoomType::Open {
            for participant in &roster {
                check_quota(tx, rules, participant, request.date, &slot)?;
            }
        }
    }

    debug!(
        room = %room_ref,
        date = %request.date,
        slot_id = slot.id,
        state = %state,
        roster_size = roster.len(),
        "Admission checks passed"
    );

    let new = NewReservation {
        room: room_ref,
        date: request.date,
        slot_id: slot.id,
        state,
        roster,
    };

    tx.insert_reservation(&new).map_err(|e| match e {
        StoreError::UniqueViolation(_) => CoreError::Conflict(ConflictReason::SlotAlreadyBooked {
            room: new.room.clone(),
            date: new.date,
            slot_id: new.slot_id,
        }),
        other => other.into(),
    })
}

/// Requested initial state; absent means `active`
fn requested_state(raw: Option<&str>) -> CoreResult<ReservationState> {
    match raw {
        None => Ok(ReservationState::Active),
        Some(s) => s
            .parse()
            .map_err(|e: salas_api::UnknownVariant| CoreError::Validation(e.to_string())),
    }
}

/// Normalize raw participant ids, dropping repeats but keeping first-seen order
pub(crate) fn normalize_ids(raw: &[String]) -> CoreResult<Vec<ParticipantId>> {
    let mut ids: Vec<ParticipantId> = Vec::with_capacity(raw.len());
    for value in raw {
        let id = ParticipantId::parse(value)?;
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    Ok(ids)
}
