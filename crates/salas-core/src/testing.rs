//! Shared fixtures for unit tests

use chrono::{NaiveDate, NaiveTime};
use salas_api::{
    Catalog, Participant, ProfileType, Program, ProgramLevel, ProgramLink, ProgramRole, Room,
    RoomType, TimeSlot,
};
use salas_store::{SqliteStore, Store};
use salas_util::ParticipantId;

/// Student with no program links
pub const STUDENT: &str = "1111111";
/// Student enrolled in a grad program
pub const GRAD_ENROLLED: &str = "2222222";
/// Faculty profile
pub const FACULTY: &str = "3333333";
/// Student holding a faculty role in an undergrad program
pub const TEACHING_STUDENT: &str = "4444444";
/// Grad-student profile
pub const GRAD_STUDENT: &str = "5555555";
/// Another plain student
pub const OTHER_STUDENT: &str = "6666666";

pub fn pid(s: &str) -> ParticipantId {
    ParticipantId::parse(s).unwrap()
}

pub fn date(s: &str) -> NaiveDate {
    salas_util::parse_date(s).unwrap()
}

fn slot(id: i64, start: (u32, u32), end: (u32, u32)) -> TimeSlot {
    TimeSlot {
        id,
        start: NaiveTime::from_hms_opt(start.0, start.1, 0).unwrap(),
        end: NaiveTime::from_hms_opt(end.0, end.1, 0).unwrap(),
    }
}

fn room(name: &str, capacity: u32, room_type: RoomType) -> Room {
    Room {
        building: "Central".into(),
        name: name.into(),
        capacity,
        room_type,
    }
}

fn participant(id: &str, profile: ProfileType, programs: Vec<ProgramLink>) -> Participant {
    Participant {
        id: pid(id),
        profile,
        programs,
    }
}

pub fn test_catalog() -> Catalog {
    Catalog {
        programs: vec![
            Program {
                name: "MBA".into(),
                level: ProgramLevel::Grad,
            },
            Program {
                name: "Engineering".into(),
                level: ProgramLevel::Undergrad,
            },
        ],
        rooms: vec![
            room("Lab-1", 2, RoomType::Open),
            room("Lab-2", 4, RoomType::Open),
            room("Grad-Room", 4, RoomType::GradOnly),
            room("Faculty-Room", 3, RoomType::FacultyOnly),
        ],
        slots: vec![
            slot(1, (8, 0), (9, 0)),
            slot(2, (9, 0), (10, 30)),
            slot(3, (10, 30), (11, 0)),
            slot(4, (11, 0), (12, 0)),
            slot(5, (14, 0), (15, 0)),
        ],
        participants: vec![
            participant(STUDENT, ProfileType::Student, vec![]),
            participant(
                GRAD_ENROLLED,
                ProfileType::Student,
                vec![ProgramLink {
                    program: "MBA".into(),
                    level: ProgramLevel::Grad,
                    role: ProgramRole::Student,
                }],
            ),
            participant(FACULTY, ProfileType::Faculty, vec![]),
            participant(
                TEACHING_STUDENT,
                ProfileType::Student,
                vec![ProgramLink {
                    program: "Engineering".into(),
                    level: ProgramLevel::Undergrad,
                    role: ProgramRole::Faculty,
                }],
            ),
            participant(GRAD_STUDENT, ProfileType::GradStudent, vec![]),
            participant(OTHER_STUDENT, ProfileType::Student, vec![]),
        ],
    }
}

pub fn seeded_store() -> SqliteStore {
    let store = SqliteStore::in_memory().unwrap();
    store.seed_catalog(&test_catalog()).unwrap();
    store
}
