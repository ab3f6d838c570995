//! Schema migrations
//!
//! Applied in order at open, tracked with `PRAGMA user_version`. A database
//! already at `SCHEMA_VERSION` is left untouched.

use rusqlite::Connection;
use tracing::{debug, info};

use crate::StoreResult;

const V1_CATALOG_AND_RESERVATIONS: &str = r#"
    CREATE TABLE IF NOT EXISTS programs (
        name TEXT PRIMARY KEY,
        level TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS rooms (
        building TEXT NOT NULL,
        name TEXT NOT NULL,
        capacity INTEGER NOT NULL CHECK (capacity > 0),
        room_type TEXT NOT NULL,
        PRIMARY KEY (building, name)
    );

    CREATE TABLE IF NOT EXISTS time_slots (
        id INTEGER PRIMARY KEY,
        start_time TEXT NOT NULL,
        end_time TEXT NOT NULL,
        CHECK (end_time > start_time)
    );

    CREATE TABLE IF NOT EXISTS participants (
        id TEXT PRIMARY KEY,
        profile TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS participant_programs (
        participant_id TEXT NOT NULL REFERENCES participants(id),
        program TEXT NOT NULL REFERENCES programs(name),
        role TEXT NOT NULL,
        PRIMARY KEY (participant_id, program, role)
    );

    -- At most one reservation per (room, date, slot), whatever its state
    CREATE TABLE IF NOT EXISTS reservations (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        building TEXT NOT NULL,
        room_name TEXT NOT NULL,
        date TEXT NOT NULL,
        slot_id INTEGER NOT NULL REFERENCES time_slots(id),
        state TEXT NOT NULL,
        UNIQUE (building, room_name, date, slot_id),
        FOREIGN KEY (building, room_name) REFERENCES rooms(building, name)
    );

    CREATE TABLE IF NOT EXISTS roster (
        reservation_id INTEGER NOT NULL REFERENCES reservations(id),
        participant_id TEXT NOT NULL REFERENCES participants(id),
        attended INTEGER,
        PRIMARY KEY (reservation_id, participant_id)
    );

    CREATE TABLE IF NOT EXISTS sanctions (
        participant_id TEXT NOT NULL REFERENCES participants(id),
        start_date TEXT NOT NULL,
        end_date TEXT NOT NULL,
        PRIMARY KEY (participant_id, start_date),
        CHECK (end_date > start_date)
    );

    CREATE INDEX IF NOT EXISTS idx_roster_participant ON roster(participant_id);
    CREATE INDEX IF NOT EXISTS idx_reservations_date ON reservations(date);
"#;

const V2_AUDIT_LOG: &str = r#"
    -- Audit log (append-only)
    CREATE TABLE IF NOT EXISTS audit_log (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        timestamp TEXT NOT NULL,
        event_json TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_audit_timestamp ON audit_log(timestamp);
"#;

const MIGRATIONS: &[&str] = &[V1_CATALOG_AND_RESERVATIONS, V2_AUDIT_LOG];

/// Schema version after every migration has run
pub const SCHEMA_VERSION: u32 = MIGRATIONS.len() as u32;

/// Bring the schema up to date. Returns the version found before migrating.
pub(crate) fn migrate(conn: &mut Connection) -> StoreResult<u32> {
    let current: u32 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;

    if current >= SCHEMA_VERSION {
        debug!(version = current, "Schema up to date");
        return Ok(current);
    }

    let tx = conn.transaction()?;
    for (index, sql) in MIGRATIONS.iter().enumerate().skip(current as usize) {
        tx.execute_batch(sql)?;
        debug!(version = index + 1, "Migration applied");
    }
    tx.pragma_update(None, "user_version", SCHEMA_VERSION)?;
    tx.commit()?;

    info!(from = current, to = SCHEMA_VERSION, "Schema migrated");
    Ok(current)
}
