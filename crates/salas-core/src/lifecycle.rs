//! Reservation state machine and sanction issuance
//!
//! Any state may be patched to any other state. Reaching `no-show` has a
//! side effect: roster members are sanctioned from the reservation date for
//! `Rules::sanction_months` months. Sanction writes share the transaction of
//! the state update.

use chrono::NaiveDate;
use salas_api::{AttendanceRequest, NotFoundTarget, Reservation, ReservationState, Sanction};
use salas_config::Rules;
use salas_store::{AuditEvent, AuditEventType, StoreTx};
use salas_util::{add_months, ParticipantId, ReservationId};
use serde::Serialize;
use tracing::{debug, info};

use crate::admission::normalize_ids;
use crate::{CoreError, CoreResult};

/// Result of a state change or attendance recording
#[derive(Debug, Clone, Serialize)]
pub struct Transition {
    /// The reservation after the change
    pub reservation: Reservation,

    /// State before the change
    pub previous: ReservationState,

    /// Sanctions newly written by this change
    pub issued: Vec<Sanction>,
}

/// Administrative status change.
///
/// Moving to `no-show` sanctions the whole roster, since no attendance data
/// distinguishes attendees from absentees on this path.
pub fn change_state(
    tx: &dyn StoreTx,
    rules: &Rules,
    id: ReservationId,
    new_state: ReservationState,
) -> CoreResult<Transition> {
    let mut reservation = load(tx, id)?;
    let previous = reservation.state;

    tx.set_state(id, new_state)?;
    reservation.state = new_state;

    let mut issued = Vec::new();
    if new_state == ReservationState::NoShow {
        let roster: Vec<ParticipantId> = reservation.participants().cloned().collect();
        for participant in &roster {
            let sanction = issue_sanction(tx, rules, participant, reservation.date, Some(id))?;
            issued.extend(sanction);
        }
    }

    debug!(
        reservation_id = %id,
        from = %previous,
        to = %new_state,
        sanctions = issued.len(),
        "State changed"
    );

    Ok(Transition {
        reservation,
        previous,
        issued,
    })
}

/// Take attendance for a reservation.
///
/// Every roster member is marked absent, then the `present` ones attended.
/// With at least one attendee the reservation is `completed` and nobody is
/// sanctioned, absentees included. With none it is a `no-show`, and the
/// absentees (the whole roster) are sanctioned when
/// `request.sanction_absentees` is set.
pub fn record_attendance(
    tx: &dyn StoreTx,
    rules: &Rules,
    id: ReservationId,
    request: &AttendanceRequest,
) -> CoreResult<Transition> {
    let mut reservation = load(tx, id)?;
    let previous = reservation.state;

    if reservation.roster.is_empty() {
        return Err(CoreError::Validation(format!(
            "reservation {} has an empty roster",
            id
        )));
    }

    let present = normalize_ids(&request.present)?;
    let strangers: Vec<String> = present
        .iter()
        .filter(|p| !reservation.has_participant(p))
        .map(ToString::to_string)
        .collect();
    if !strangers.is_empty() {
        return Err(CoreError::Validation(format!(
            "not on the roster of reservation {}: {}",
            id,
            strangers.join(", ")
        )));
    }

    tx.set_attendance(id, &present)?;
    for entry in &mut reservation.roster {
        entry.attended = Some(present.contains(&entry.participant));
    }

    let new_state = if present.is_empty() {
        ReservationState::NoShow
    } else {
        ReservationState::Completed
    };
    tx.set_state(id, new_state)?;
    reservation.state = new_state;

    let absentees: Vec<ParticipantId> = reservation
        .roster
        .iter()
        .filter(|entry| entry.attended != Some(true))
        .map(|entry| entry.participant.clone())
        .collect();

    let mut issued = Vec::new();
    if new_state == ReservationState::NoShow && request.sanction_absentees {
        for participant in &absentees {
            let sanction = issue_sanction(tx, rules, participant, reservation.date, Some(id))?;
            issued.extend(sanction);
        }
    }

    debug!(
        reservation_id = %id,
        attended = present.len(),
        absent = absentees.len(),
        state = %new_state,
        sanctions = issued.len(),
        "Attendance applied"
    );

    Ok(Transition {
        reservation,
        previous,
        issued,
    })
}

/// Sanction `participant` from `reference` for `rules.sanction_months`.
///
/// A sanction already on record with the same start is left as it is and
/// `None` is returned.
pub fn issue_sanction(
    tx: &dyn StoreTx,
    rules: &Rules,
    participant: &ParticipantId,
    reference: NaiveDate,
    reservation_id: Option<ReservationId>,
) -> CoreResult<Option<Sanction>> {
    let end = add_months(reference, rules.sanction_months).ok_or_else(|| {
        CoreError::Internal(format!(
            "sanction end out of range: {} + {} months",
            reference, rules.sanction_months
        ))
    })?;

    let sanction = Sanction {
        participant: participant.clone(),
        start: reference,
        end,
    };
    record_sanction(tx, &sanction, reservation_id)
}

/// Write a sanction unless one with the same (participant, start) exists,
/// auditing it in the same transaction.
pub(crate) fn record_sanction(
    tx: &dyn StoreTx,
    sanction: &Sanction,
    reservation_id: Option<ReservationId>,
) -> CoreResult<Option<Sanction>> {
    if !tx.upsert_ignore_existing(sanction)? {
        debug!(
            participant = %sanction.participant,
            start = %sanction.start,
            "Sanction already on record"
        );
        return Ok(None);
    }

    tx.append_audit(AuditEvent::new(AuditEventType::SanctionIssued {
        participant: sanction.participant.clone(),
        start: sanction.start,
        end: sanction.end,
        reservation_id,
    }))?;

    info!(
        participant = %sanction.participant,
        start = %sanction.start,
        end = %sanction.end,
        "Sanction issued"
    );

    Ok(Some(sanction.clone()))
}

fn load(tx: &dyn StoreTx, id: ReservationId) -> CoreResult<Reservation> {
    tx.get_reservation(id)?
        .ok_or(CoreError::NotFound(NotFoundTarget::Reservation { id }))
}
