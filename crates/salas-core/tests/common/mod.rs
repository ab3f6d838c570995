//! Catalog shared by the integration tests

#![allow(dead_code)]

use chrono::{NaiveDate, NaiveTime};
use salas_api::{
    AdmissionRequest, Catalog, Participant, ProfileType, Room, RoomType, TimeSlot,
};
use salas_config::Rules;
use salas_core::ReservationEngine;
use salas_store::{SqliteStore, Store};
use salas_util::ParticipantId;
use std::path::Path;
use std::sync::Arc;

pub const P: &str = "1234567";
pub const A: &str = "2345678";
pub const B: &str = "3456789";
pub const C: &str = "45678901";

pub fn date(s: &str) -> NaiveDate {
    salas_util::parse_date(s).unwrap()
}

pub fn pid(s: &str) -> ParticipantId {
    ParticipantId::parse(s).unwrap()
}

fn time(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

pub fn make_catalog() -> Catalog {
    let student = |id: &str| Participant {
        id: pid(id),
        profile: ProfileType::Student,
        programs: vec![],
    };

    Catalog {
        programs: vec![],
        rooms: vec![
            Room {
                building: "Central".into(),
                name: "Lab-1".into(),
                capacity: 2,
                room_type: RoomType::Open,
            },
            Room {
                building: "Central".into(),
                name: "Lab-2".into(),
                capacity: 6,
                room_type: RoomType::Open,
            },
            Room {
                building: "Central".into(),
                name: "Grad-Room".into(),
                capacity: 4,
                room_type: RoomType::GradOnly,
            },
        ],
        slots: vec![
            TimeSlot {
                id: 1,
                start: time(8, 0),
                end: time(9, 0),
            },
            TimeSlot {
                id: 2,
                start: time(9, 0),
                end: time(10, 30),
            },
            TimeSlot {
                id: 3,
                start: time(10, 30),
                end: time(11, 0),
            },
            TimeSlot {
                id: 4,
                start: time(11, 0),
                end: time(11, 15),
            },
        ],
        participants: vec![student(P), student(A), student(B), student(C)],
    }
}

pub fn make_engine() -> (ReservationEngine, Arc<dyn Store>) {
    let store = SqliteStore::in_memory().unwrap();
    store.seed_catalog(&make_catalog()).unwrap();
    let store: Arc<dyn Store> = Arc::new(store);
    (ReservationEngine::new(Rules::default(), store.clone()), store)
}

pub fn make_file_engine(path: &Path) -> ReservationEngine {
    let store = SqliteStore::open(path).unwrap();
    store.seed_catalog(&make_catalog()).unwrap();
    ReservationEngine::new(Rules::default(), Arc::new(store))
}

/// Engine on its own connection to an already seeded database file
pub fn open_file_engine(path: &Path) -> ReservationEngine {
    let store = SqliteStore::open(path).unwrap();
    ReservationEngine::new(Rules::default(), Arc::new(store))
}

pub fn book(room: &str, day: &str, slot_id: i64, ids: &[&str]) -> AdmissionRequest {
    AdmissionRequest::new("Central", room, date(day), slot_id, ids.iter().copied())
}
