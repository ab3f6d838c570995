//! Fair-use quota accounting
//!
//! Quotas only apply to open rooms. The same-day cap charges occupancy
//! whatever the attendance outcome (active, no-show and completed bookings
//! all count), while the weekly cap counts active bookings only.

use chrono::{Duration, NaiveDate};
use salas_api::{ConflictReason, ReservationState, RoomType, TimeSlot};
use salas_config::Rules;
use salas_store::{QuotaQuery, ReservationRepo};
use salas_util::{as_hours, ParticipantId};
use tracing::debug;

use crate::{CoreError, CoreResult};

/// States charged against the same-day cap
pub const DAILY_CHARGED_STATES: [ReservationState; 3] = [
    ReservationState::Active,
    ReservationState::NoShow,
    ReservationState::Completed,
];

/// Total slot time a participant already holds in open rooms on `date`
pub fn daily_booked_open<R: ReservationRepo + ?Sized>(
    repo: &R,
    participant: &ParticipantId,
    date: NaiveDate,
) -> CoreResult<Duration> {
    let rows = repo.quota_rows(
        &QuotaQuery::on_day(participant.clone(), date)
            .room_type(RoomType::Open)
            .states(&DAILY_CHARGED_STATES),
    )?;

    Ok(rows
        .iter()
        .fold(Duration::zero(), |total, row| total + row.slot.duration()))
}

/// Same as [`daily_booked_open`], in fractional hours
pub fn daily_hours_open<R: ReservationRepo + ?Sized>(
    repo: &R,
    participant: &ParticipantId,
    date: NaiveDate,
) -> CoreResult<f64> {
    daily_booked_open(repo, participant, date).map(as_hours)
}

/// Active open-room bookings of a participant in the ISO week of `date`
pub fn weekly_active_count_open<R: ReservationRepo + ?Sized>(
    repo: &R,
    participant: &ParticipantId,
    date: NaiveDate,
) -> CoreResult<u32> {
    let rows = repo.quota_rows(
        &QuotaQuery::in_week_of(participant.clone(), date)
            .room_type(RoomType::Open)
            .states(&[ReservationState::Active]),
    )?;

    Ok(u32::try_from(rows.len()).unwrap_or(u32::MAX))
}

/// Reject a new open-room booking of `slot` on `date` if it would break
/// either quota for `participant`.
pub fn check_quota<R: ReservationRepo + ?Sized>(
    repo: &R,
    rules: &Rules,
    participant: &ParticipantId,
    date: NaiveDate,
    slot: &TimeSlot,
) -> CoreResult<()> {
    let booked = daily_booked_open(repo, participant, date)?;
    let requested = slot.duration();

    debug!(
        participant = %participant,
        date = %date,
        booked_minutes = booked.num_minutes(),
        requested_minutes = requested.num_minutes(),
        "Daily quota check"
    );

    if booked + requested > rules.daily_quota {
        return Err(CoreError::Conflict(ConflictReason::DailyQuotaExceeded {
            participant: participant.clone(),
            booked_minutes: booked.num_minutes(),
            requested_minutes: requested.num_minutes(),
            limit_minutes: rules.daily_quota.num_minutes(),
        }));
    }

    let active = weekly_active_count_open(repo, participant, date)?;
    debug!(participant = %participant, active, "Weekly quota check");

    if active >= rules.weekly_active_limit {
        return Err(CoreError::Conflict(ConflictReason::WeeklyQuotaExceeded {
            participant: participant.clone(),
            active_count: active,
            limit: rules.weekly_active_limit,
        }));
    }

    Ok(())
}
