//! Parameter objects for reservation queries
//!
//! Each optional field adds one condition to the generated WHERE clause;
//! an unset field does not constrain the result.

use chrono::NaiveDate;
use salas_api::{ReservationState, RoomType, TimeSlot};
use salas_util::{iso_week_bounds, ParticipantId, ReservationId, RoomRef};

/// Reservations of one participant over a date span, for quota accounting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuotaQuery {
    pub participant: ParticipantId,
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub room_type: Option<RoomType>,
    /// Empty means any state
    pub states: Vec<ReservationState>,
}

impl QuotaQuery {
    /// Reservations on a single date
    pub fn on_day(participant: ParticipantId, date: NaiveDate) -> Self {
        Self {
            participant,
            from: date,
            to: date,
            room_type: None,
            states: Vec::new(),
        }
    }

    /// Reservations in the Monday-start ISO week containing `date`
    pub fn in_week_of(participant: ParticipantId, date: NaiveDate) -> Self {
        let (monday, sunday) = iso_week_bounds(date);
        Self {
            participant,
            from: monday,
            to: sunday,
            room_type: None,
            states: Vec::new(),
        }
    }

    pub fn room_type(mut self, room_type: RoomType) -> Self {
        self.room_type = Some(room_type);
        self
    }

    pub fn states(mut self, states: &[ReservationState]) -> Self {
        self.states = states.to_vec();
        self
    }
}

/// One reservation matched by a [`QuotaQuery`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuotaRow {
    pub reservation_id: ReservationId,
    pub date: NaiveDate,
    pub state: ReservationState,
    pub slot: TimeSlot,
}

/// Optional filters for listing reservations
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReservationFilter {
    pub room: Option<RoomRef>,
    pub building: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub state: Option<ReservationState>,
    pub participant: Option<ParticipantId>,
}

impl ReservationFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn room(mut self, room: RoomRef) -> Self {
        self.room = Some(room);
        self
    }

    pub fn building(mut self, building: impl Into<String>) -> Self {
        self.building = Some(building.into());
        self
    }

    pub fn between(mut self, from: NaiveDate, to: NaiveDate) -> Self {
        self.from = Some(from);
        self.to = Some(to);
        self
    }

    pub fn on(self, date: NaiveDate) -> Self {
        self.between(date, date)
    }

    pub fn state(mut self, state: ReservationState) -> Self {
        self.state = Some(state);
        self
    }

    pub fn participant(mut self, participant: ParticipantId) -> Self {
        self.participant = Some(participant);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn week_query_spans_monday_to_sunday() {
        let p = ParticipantId::parse("1234567").unwrap();
        // Thursday
        let q = QuotaQuery::in_week_of(p, NaiveDate::from_ymd_opt(2024, 3, 7).unwrap())
            .room_type(RoomType::Open)
            .states(&[ReservationState::Active]);

        assert_eq!(q.from, NaiveDate::from_ymd_opt(2024, 3, 4).unwrap());
        assert_eq!(q.to, NaiveDate::from_ymd_opt(2024, 3, 10).unwrap());
        assert_eq!(q.room_type, Some(RoomType::Open));
        assert_eq!(q.states, vec![ReservationState::Active]);
    }

    #[test]
    fn filter_on_single_date() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        let f = ReservationFilter::new().building("Central").on(date);
        assert_eq!(f.from, Some(date));
        assert_eq!(f.to, Some(date));
        assert!(f.state.is_none());
    }
}
