//! SQLite-based store implementation

use chrono::{DateTime, Local, NaiveDate, NaiveTime};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, TransactionBehavior};
use salas_api::{
    Catalog, Participant, ProgramLink, Reservation, ReservationState, Room, RosterEntry, Sanction,
    TimeSlot,
};
use salas_util::{ParticipantId, ReservationId, RoomRef};
use std::collections::HashMap;
use std::fmt::Display;
use std::path::Path;
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, warn};

use crate::migrations::{migrate, SCHEMA_VERSION};
use crate::{
    AuditEvent, AuditEventType, CatalogReader, NewReservation, QuotaQuery, QuotaRow,
    ReservationFilter, ReservationRepo, SanctionLedger, Store, StoreError, StoreResult, StoreTx,
};

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M:%S";

/// SQLite-based store
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create a store at the given path.
    ///
    /// File databases run in WAL mode so readers on other connections do not
    /// wait on a writer.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        debug!(journal_mode = %mode, "Opened database file");
        Self::from_connection(conn)
    }

    /// Create an in-memory store (for testing)
    pub fn in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn)
    }

    fn from_connection(mut conn: Connection) -> StoreResult<Self> {
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;

        let previous = migrate(&mut conn)?;
        if previous < SCHEMA_VERSION {
            insert_audit(
                &conn,
                &AuditEvent::new(AuditEventType::SchemaMigrated {
                    from_version: previous,
                    to_version: SCHEMA_VERSION,
                }),
            )?;
        }

        debug!(version = SCHEMA_VERSION, "Store schema initialized");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Database("connection lock poisoned".into()))
    }
}

impl Store for SqliteStore {
    fn begin(&self) -> StoreResult<Box<dyn StoreTx + '_>> {
        let conn = self.lock()?;
        Ok(Box::new(SqliteTx::begin(conn, TransactionBehavior::Immediate)?))
    }

    fn begin_read(&self) -> StoreResult<Box<dyn StoreTx + '_>> {
        let conn = self.lock()?;
        Ok(Box::new(SqliteTx::begin(conn, TransactionBehavior::Deferred)?))
    }

    fn append_audit(&self, event: AuditEvent) -> StoreResult<()> {
        let conn = self.lock()?;
        insert_audit(&conn, &event)
    }

    fn get_recent_audits(&self, limit: usize) -> StoreResult<Vec<AuditEvent>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            "SELECT id, timestamp, event_json FROM audit_log ORDER BY id DESC LIMIT ?",
        )?;

        let rows = stmt.query_map([limit], |row| {
            let id: i64 = row.get(0)?;
            let timestamp_str: String = row.get(1)?;
            let event_json: String = row.get(2)?;
            Ok((id, timestamp_str, event_json))
        })?;

        let mut events = Vec::new();
        for row in rows {
            let (id, timestamp_str, event_json) = row?;
            let timestamp = DateTime::parse_from_rfc3339(&timestamp_str)
                .map(|dt| dt.with_timezone(&Local))
                .unwrap_or_else(|_| Local::now());
            let event: AuditEventType = serde_json::from_str(&event_json)?;

            events.push(AuditEvent {
                id,
                timestamp,
                event,
            });
        }

        Ok(events)
    }

    fn seed_catalog(&self, catalog: &Catalog) -> StoreResult<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        for program in &catalog.programs {
            tx.execute(
                r#"
                INSERT INTO programs (name, level) VALUES (?, ?)
                ON CONFLICT(name) DO UPDATE SET level = excluded.level
                "#,
                params![program.name, program.level.as_str()],
            )?;
        }

        for room in &catalog.rooms {
            tx.execute(
                r#"
                INSERT INTO rooms (building, name, capacity, room_type) VALUES (?, ?, ?, ?)
                ON CONFLICT(building, name)
                DO UPDATE SET capacity = excluded.capacity, room_type = excluded.room_type
                "#,
                params![room.building, room.name, room.capacity, room.room_type.as_str()],
            )?;
        }

        for slot in &catalog.slots {
            tx.execute(
                r#"
                INSERT INTO time_slots (id, start_time, end_time) VALUES (?, ?, ?)
                ON CONFLICT(id)
                DO UPDATE SET start_time = excluded.start_time, end_time = excluded.end_time
                "#,
                params![slot.id, fmt_time(slot.start), fmt_time(slot.end)],
            )?;
        }

        for participant in &catalog.participants {
            let id = participant.id.as_str();
            tx.execute(
                r#"
                INSERT INTO participants (id, profile) VALUES (?, ?)
                ON CONFLICT(id) DO UPDATE SET profile = excluded.profile
                "#,
                params![id, participant.profile.as_str()],
            )?;
            tx.execute(
                "DELETE FROM participant_programs WHERE participant_id = ?",
                [id],
            )?;
            for link in &participant.programs {
                tx.execute(
                    r#"
                    INSERT OR IGNORE INTO participant_programs (participant_id, program, role)
                    VALUES (?, ?, ?)
                    "#,
                    params![id, link.program, link.role.as_str()],
                )?;
            }
        }

        insert_audit(
            &tx,
            &AuditEvent::new(AuditEventType::CatalogSeeded {
                rooms: catalog.rooms.len(),
                slots: catalog.slots.len(),
                participants: catalog.participants.len(),
            }),
        )?;

        tx.commit()?;
        debug!(
            rooms = catalog.rooms.len(),
            slots = catalog.slots.len(),
            participants = catalog.participants.len(),
            "Catalog seeded"
        );
        Ok(())
    }

    fn is_healthy(&self) -> bool {
        match self.conn.lock() {
            Ok(conn) => conn.query_row("SELECT 1", [], |_| Ok(())).is_ok(),
            Err(_) => {
                warn!("Store lock poisoned");
                false
            }
        }
    }
}

/// A transaction holding the connection for its whole lifetime.
///
/// Write transactions use `BEGIN IMMEDIATE`, taking SQLite's write lock up
/// front so every read made through them sees the state their writes will
/// commit against. Read transactions use a deferred `BEGIN`.
pub struct SqliteTx<'a> {
    conn: MutexGuard<'a, Connection>,
    finished: bool,
}

impl<'a> SqliteTx<'a> {
    fn begin(conn: MutexGuard<'a, Connection>, behavior: TransactionBehavior) -> StoreResult<Self> {
        let sql = match behavior {
            TransactionBehavior::Immediate => "BEGIN IMMEDIATE",
            TransactionBehavior::Exclusive => "BEGIN EXCLUSIVE",
            _ => "BEGIN DEFERRED",
        };
        conn.execute_batch(sql)?;
        Ok(Self {
            conn,
            finished: false,
        })
    }

    fn load_roster(&self, id: ReservationId) -> StoreResult<Vec<RosterEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT participant_id, attended FROM roster WHERE reservation_id = ? ORDER BY rowid",
        )?;

        let rows = stmt
            .query_map([id.get()], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, Option<bool>>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(participant, attended)| {
                Ok(RosterEntry {
                    participant: parse_participant(&participant)?,
                    attended,
                })
            })
            .collect()
    }

    fn with_rosters(&self, rows: Vec<ReservationRow>) -> StoreResult<Vec<Reservation>> {
        rows.into_iter()
            .map(|row| {
                let roster = self.load_roster(ReservationId::new(row.id))?;
                row.into_reservation(roster)
            })
            .collect()
    }
}

impl Drop for SqliteTx<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        match self.conn.execute_batch("ROLLBACK") {
            Ok(()) => debug!("Transaction rolled back"),
            Err(e) => warn!(error = %e, "Rollback failed"),
        }
    }
}

impl CatalogReader for SqliteTx<'_> {
    fn get_room(&self, room: &RoomRef) -> StoreResult<Option<Room>> {
        let row: Option<(u32, String)> = self
            .conn
            .query_row(
                "SELECT capacity, room_type FROM rooms WHERE building = ? AND name = ?",
                params![room.building, room.name],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        row.map(|(capacity, room_type)| {
            Ok(Room {
                building: room.building.clone(),
                name: room.name.clone(),
                capacity,
                room_type: parse_column(&room_type)?,
            })
        })
        .transpose()
    }

    fn get_time_slot(&self, id: i64) -> StoreResult<Option<TimeSlot>> {
        let row: Option<(String, String)> = self
            .conn
            .query_row(
                "SELECT start_time, end_time FROM time_slots WHERE id = ?",
                [id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        row.map(|(start, end)| {
            Ok(TimeSlot {
                id,
                start: parse_time_column(&start)?,
                end: parse_time_column(&end)?,
            })
        })
        .transpose()
    }

    fn list_time_slots(&self) -> StoreResult<Vec<TimeSlot>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, start_time, end_time FROM time_slots ORDER BY id")?;

        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(id, start, end)| {
                Ok(TimeSlot {
                    id,
                    start: parse_time_column(&start)?,
                    end: parse_time_column(&end)?,
                })
            })
            .collect()
    }

    fn get_participants(
        &self,
        ids: &[ParticipantId],
    ) -> StoreResult<HashMap<ParticipantId, Participant>> {
        let mut profile_stmt = self
            .conn
            .prepare("SELECT profile FROM participants WHERE id = ?")?;
        let mut links_stmt = self.conn.prepare(
            r#"
            SELECT pp.program, p.level, pp.role
            FROM participant_programs pp
            JOIN programs p ON p.name = pp.program
            WHERE pp.participant_id = ?
            ORDER BY pp.program, pp.role
            "#,
        )?;

        let mut found = HashMap::new();
        for id in ids {
            if found.contains_key(id) {
                continue;
            }

            let profile: Option<String> = profile_stmt
                .query_row([id.as_str()], |row| row.get(0))
                .optional()?;
            let Some(profile) = profile else {
                continue;
            };

            let links = links_stmt
                .query_map([id.as_str()], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                })?
                .collect::<Result<Vec<_>, _>>()?;

            let programs = links
                .into_iter()
                .map(|(program, level, role)| {
                    Ok(ProgramLink {
                        program,
                        level: parse_column(&level)?,
                        role: parse_column(&role)?,
                    })
                })
                .collect::<StoreResult<Vec<_>>>()?;

            found.insert(
                id.clone(),
                Participant {
                    id: id.clone(),
                    profile: parse_column(&profile)?,
                    programs,
                },
            );
        }

        Ok(found)
    }
}

impl ReservationRepo for SqliteTx<'_> {
    fn insert_reservation(&self, new: &NewReservation) -> StoreResult<Reservation> {
        self.conn.execute(
            r#"
            INSERT INTO reservations (building, room_name, date, slot_id, state)
            VALUES (?, ?, ?, ?, ?)
            "#,
            params![
                new.room.building,
                new.room.name,
                fmt_date(new.date),
                new.slot_id,
                new.state.as_str()
            ],
        )?;
        let id = ReservationId::new(self.conn.last_insert_rowid());

        let mut stmt = self.conn.prepare(
            "INSERT INTO roster (reservation_id, participant_id, attended) VALUES (?, ?, NULL)",
        )?;
        for participant in &new.roster {
            stmt.execute(params![id.get(), participant.as_str()])?;
        }

        debug!(
            reservation_id = %id,
            room = %new.room,
            date = %new.date,
            slot_id = new.slot_id,
            roster_size = new.roster.len(),
            "Reservation inserted"
        );

        Ok(Reservation {
            id,
            room: new.room.clone(),
            date: new.date,
            slot_id: new.slot_id,
            state: new.state,
            roster: new
                .roster
                .iter()
                .map(|participant| RosterEntry {
                    participant: participant.clone(),
                    attended: None,
                })
                .collect(),
        })
    }

    fn get_reservation(&self, id: ReservationId) -> StoreResult<Option<Reservation>> {
        let row = self
            .conn
            .query_row(
                &format!("{} WHERE r.id = ?", ReservationRow::SELECT),
                [id.get()],
                ReservationRow::from_row,
            )
            .optional()?;

        match row {
            Some(row) => {
                let roster = self.load_roster(id)?;
                Ok(Some(row.into_reservation(roster)?))
            }
            None => Ok(None),
        }
    }

    fn set_state(&self, id: ReservationId, state: ReservationState) -> StoreResult<()> {
        let changed = self.conn.execute(
            "UPDATE reservations SET state = ? WHERE id = ?",
            params![state.as_str(), id.get()],
        )?;

        if changed == 0 {
            return Err(StoreError::NotFound(format!("reservation {}", id)));
        }

        debug!(reservation_id = %id, state = %state, "Reservation state updated");
        Ok(())
    }

    fn set_attendance(&self, id: ReservationId, present: &[ParticipantId]) -> StoreResult<()> {
        self.conn.execute(
            "UPDATE roster SET attended = 0 WHERE reservation_id = ?",
            [id.get()],
        )?;

        let mut stmt = self.conn.prepare(
            "UPDATE roster SET attended = 1 WHERE reservation_id = ? AND participant_id = ?",
        )?;
        for participant in present {
            stmt.execute(params![id.get(), participant.as_str()])?;
        }

        debug!(reservation_id = %id, present = present.len(), "Attendance stored");
        Ok(())
    }

    fn quota_rows(&self, query: &QuotaQuery) -> StoreResult<Vec<QuotaRow>> {
        let mut conditions = Conditions::default();
        conditions.push("ro.participant_id = ?", query.participant.as_str());
        conditions.push("r.date >= ?", fmt_date(query.from));
        conditions.push("r.date <= ?", fmt_date(query.to));
        if let Some(room_type) = query.room_type {
            conditions.push("m.room_type = ?", room_type.as_str());
        }
        conditions.push_in("r.state", query.states.iter().map(|s| s.as_str()));

        let sql = format!(
            r#"
            SELECT r.id, r.date, r.state, t.id, t.start_time, t.end_time
            FROM reservations r
            JOIN roster ro ON ro.reservation_id = r.id
            JOIN time_slots t ON t.id = r.slot_id
            JOIN rooms m ON m.building = r.building AND m.name = r.room_name
            {}
            ORDER BY r.date, t.start_time, r.id
            "#,
            conditions.where_sql()
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(conditions.params.iter()), |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, i64>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(id, date, state, slot_id, start, end)| {
                Ok(QuotaRow {
                    reservation_id: ReservationId::new(id),
                    date: parse_date_column(&date)?,
                    state: parse_column(&state)?,
                    slot: TimeSlot {
                        id: slot_id,
                        start: parse_time_column(&start)?,
                        end: parse_time_column(&end)?,
                    },
                })
            })
            .collect()
    }

    fn find_reservations(&self, filter: &ReservationFilter) -> StoreResult<Vec<Reservation>> {
        let mut conditions = Conditions::default();
        if let Some(room) = &filter.room {
            conditions.push("r.building = ?", room.building.as_str());
            conditions.push("r.room_name = ?", room.name.as_str());
        }
        if let Some(building) = &filter.building {
            conditions.push("r.building = ?", building.as_str());
        }
        if let Some(from) = filter.from {
            conditions.push("r.date >= ?", fmt_date(from));
        }
        if let Some(to) = filter.to {
            conditions.push("r.date <= ?", fmt_date(to));
        }
        if let Some(state) = filter.state {
            conditions.push("r.state = ?", state.as_str());
        }
        if let Some(participant) = &filter.participant {
            conditions.push(
                "r.id IN (SELECT reservation_id FROM roster WHERE participant_id = ?)",
                participant.as_str(),
            );
        }

        let sql = format!(
            "{}{} ORDER BY r.date, r.slot_id, r.id",
            ReservationRow::SELECT,
            conditions.where_sql()
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(
                params_from_iter(conditions.params.iter()),
                ReservationRow::from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;

        self.with_rosters(rows)
    }

    fn slot_occupancy(
        &self,
        room: &RoomRef,
        date: NaiveDate,
    ) -> StoreResult<HashMap<i64, (ReservationId, ReservationState)>> {
        let mut stmt = self.conn.prepare(
            "SELECT slot_id, id, state FROM reservations WHERE building = ? AND room_name = ? AND date = ?",
        )?;

        let rows = stmt
            .query_map(params![room.building, room.name, fmt_date(date)], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(slot_id, id, state)| {
                Ok((slot_id, (ReservationId::new(id), parse_column(&state)?)))
            })
            .collect()
    }
}

impl SanctionLedger for SqliteTx<'_> {
    fn find_active(
        &self,
        participant: &ParticipantId,
        date: NaiveDate,
    ) -> StoreResult<Option<Sanction>> {
        let row: Option<(String, String)> = self
            .conn
            .query_row(
                r#"
                SELECT start_date, end_date FROM sanctions
                WHERE participant_id = ?1 AND start_date <= ?2 AND end_date >= ?2
                ORDER BY end_date DESC
                LIMIT 1
                "#,
                params![participant.as_str(), fmt_date(date)],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        row.map(|(start, end)| {
            Ok(Sanction {
                participant: participant.clone(),
                start: parse_date_column(&start)?,
                end: parse_date_column(&end)?,
            })
        })
        .transpose()
    }

    fn upsert_ignore_existing(&self, sanction: &Sanction) -> StoreResult<bool> {
        let inserted = self.conn.execute(
            r#"
            INSERT INTO sanctions (participant_id, start_date, end_date)
            VALUES (?, ?, ?)
            ON CONFLICT(participant_id, start_date) DO NOTHING
            "#,
            params![
                sanction.participant.as_str(),
                fmt_date(sanction.start),
                fmt_date(sanction.end)
            ],
        )?;

        debug!(
            participant = %sanction.participant,
            start = %sanction.start,
            inserted = inserted > 0,
            "Sanction upserted"
        );
        Ok(inserted > 0)
    }

    fn sanctions_for(&self, participant: &ParticipantId) -> StoreResult<Vec<Sanction>> {
        let mut stmt = self.conn.prepare(
            "SELECT start_date, end_date FROM sanctions WHERE participant_id = ? ORDER BY start_date DESC",
        )?;

        let rows = stmt
            .query_map([participant.as_str()], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(start, end)| {
                Ok(Sanction {
                    participant: participant.clone(),
                    start: parse_date_column(&start)?,
                    end: parse_date_column(&end)?,
                })
            })
            .collect()
    }
}

impl StoreTx for SqliteTx<'_> {
    fn append_audit(&self, event: AuditEvent) -> StoreResult<()> {
        insert_audit(&self.conn, &event)
    }

    fn commit(mut self: Box<Self>) -> StoreResult<()> {
        self.conn.execute_batch("COMMIT")?;
        self.finished = true;
        debug!("Transaction committed");
        Ok(())
    }
}

/// Reservation columns as stored, before the roster is attached
struct ReservationRow {
    id: i64,
    building: String,
    room_name: String,
    date: String,
    slot_id: i64,
    state: String,
}

impl ReservationRow {
    const SELECT: &'static str =
        "SELECT r.id, r.building, r.room_name, r.date, r.slot_id, r.state FROM reservations r";

    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            building: row.get(1)?,
            room_name: row.get(2)?,
            date: row.get(3)?,
            slot_id: row.get(4)?,
            state: row.get(5)?,
        })
    }

    fn into_reservation(self, roster: Vec<RosterEntry>) -> StoreResult<Reservation> {
        Ok(Reservation {
            id: ReservationId::new(self.id),
            room: RoomRef::new(self.building, self.room_name),
            date: parse_date_column(&self.date)?,
            slot_id: self.slot_id,
            state: parse_column(&self.state)?,
            roster,
        })
    }
}

/// WHERE-clause fragments with their bound values, in order
#[derive(Default)]
struct Conditions {
    clauses: Vec<String>,
    params: Vec<Value>,
}

impl Conditions {
    fn push(&mut self, clause: &str, value: impl Into<String>) {
        self.clauses.push(clause.to_string());
        self.params.push(Value::Text(value.into()));
    }

    fn push_in<'a>(&mut self, column: &str, values: impl IntoIterator<Item = &'a str>) {
        let values: Vec<Value> = values
            .into_iter()
            .map(|v| Value::Text(v.to_string()))
            .collect();
        if values.is_empty() {
            return;
        }

        let placeholders = vec!["?"; values.len()].join(", ");
        self.clauses.push(format!("{} IN ({})", column, placeholders));
        self.params.extend(values);
    }

    fn where_sql(&self) -> String {
        if self.clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.clauses.join(" AND "))
        }
    }
}

fn insert_audit(conn: &Connection, event: &AuditEvent) -> StoreResult<()> {
    let event_json = serde_json::to_string(&event.event)?;

    conn.execute(
        "INSERT INTO audit_log (timestamp, event_json) VALUES (?, ?)",
        params![event.timestamp.to_rfc3339(), event_json],
    )?;

    debug!(event_id = conn.last_insert_rowid(), "Audit event appended");
    Ok(())
}

fn fmt_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn fmt_time(time: NaiveTime) -> String {
    time.format(TIME_FORMAT).to_string()
}

fn parse_date_column(s: &str) -> StoreResult<NaiveDate> {
    NaiveDate::parse_from_str(s, DATE_FORMAT)
        .map_err(|e| StoreError::Serialization(format!("bad date '{}': {}", s, e)))
}

fn parse_time_column(s: &str) -> StoreResult<NaiveTime> {
    NaiveTime::parse_from_str(s, TIME_FORMAT)
        .map_err(|e| StoreError::Serialization(format!("bad time '{}': {}", s, e)))
}

fn parse_participant(s: &str) -> StoreResult<ParticipantId> {
    ParticipantId::parse(s).map_err(|e| StoreError::Serialization(e.to_string()))
}

fn parse_column<T>(s: &str) -> StoreResult<T>
where
    T: FromStr,
    T::Err: Display,
{
    s.parse()
        .map_err(|e: T::Err| StoreError::Serialization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use salas_api::{ProfileType, Program, ProgramLevel, ProgramRole, RoomType};

    fn pid(s: &str) -> ParticipantId {
        ParticipantId::parse(s).unwrap()
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, DATE_FORMAT).unwrap()
    }

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn test_catalog() -> Catalog {
        Catalog {
            programs: vec![Program {
                name: "MBA".into(),
                level: ProgramLevel::Grad,
            }],
            rooms: vec![
                Room {
                    building: "Central".into(),
                    name: "Lab-1".into(),
                    capacity: 2,
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
                    start: hm(8, 0),
                    end: hm(9, 0),
                },
                TimeSlot {
                    id: 2,
                    start: hm(9, 0),
                    end: hm(10, 30),
                },
            ],
            participants: vec![
                Participant {
                    id: pid("1111111"),
                    profile: ProfileType::Student,
                    programs: vec![],
                },
                Participant {
                    id: pid("2222222"),
                    profile: ProfileType::Student,
                    programs: vec![ProgramLink {
                        program: "MBA".into(),
                        level: ProgramLevel::Grad,
                        role: ProgramRole::Student,
                    }],
                },
            ],
        }
    }

    fn seeded_store() -> SqliteStore {
        let store = SqliteStore::in_memory().unwrap();
        store.seed_catalog(&test_catalog()).unwrap();
        store
    }

    fn booking(room: &str, day: &str, slot_id: i64, roster: &[&str]) -> NewReservation {
        NewReservation {
            room: RoomRef::new("Central", room),
            date: date(day),
            slot_id,
            state: ReservationState::Active,
            roster: roster.iter().map(|p| pid(p)).collect(),
        }
    }

    #[test]
    fn test_in_memory_store() {
        let store = SqliteStore::in_memory().unwrap();
        assert!(store.is_healthy());
    }

    #[test]
    fn test_reopen_file_keeps_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("salas.db");

        {
            let store = SqliteStore::open(&path).unwrap();
            store.seed_catalog(&test_catalog()).unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        let migrations = store
            .get_recent_audits(10)
            .unwrap()
            .into_iter()
            .filter(|e| matches!(e.event, AuditEventType::SchemaMigrated { .. }))
            .count();
        assert_eq!(migrations, 1);

        let tx = store.begin().unwrap();
        assert_eq!(tx.list_time_slots().unwrap().len(), 2);
    }

    #[test]
    fn test_reads_do_not_wait_on_open_writer() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("salas.db");
        let writer_store = SqliteStore::open(&path).unwrap();
        writer_store.seed_catalog(&test_catalog()).unwrap();
        let reader_store = SqliteStore::open(&path).unwrap();

        let writer = writer_store.begin().unwrap();
        let created = writer
            .insert_reservation(&booking("Lab-1", "2024-03-04", 1, &["1111111"]))
            .unwrap();

        // A second connection reads the last committed state while the
        // write lock is held
        let started = std::time::Instant::now();
        {
            let reader = reader_store.begin_read().unwrap();
            assert!(reader.get_reservation(created.id).unwrap().is_none());
            assert_eq!(reader.list_time_slots().unwrap().len(), 2);
            reader.commit().unwrap();
        }
        assert!(started.elapsed() < Duration::from_secs(1));

        writer.commit().unwrap();

        let reader = reader_store.begin_read().unwrap();
        assert_eq!(reader.get_reservation(created.id).unwrap(), Some(created));
    }

    #[test]
    fn test_audit_log() {
        let store = SqliteStore::in_memory().unwrap();

        // Migration is recorded on a fresh database
        let events = store.get_recent_audits(10).unwrap();
        assert_eq!(events.len(), 1);
        assert!(matches!(
            events[0].event,
            AuditEventType::SchemaMigrated { from_version: 0, .. }
        ));

        store
            .append_audit(AuditEvent::new(AuditEventType::CatalogSeeded {
                rooms: 1,
                slots: 2,
                participants: 3,
            }))
            .unwrap();

        let events = store.get_recent_audits(1).unwrap();
        assert!(matches!(
            events[0].event,
            AuditEventType::CatalogSeeded { rooms: 1, .. }
        ));
    }

    #[test]
    fn test_catalog_lookup() {
        let store = seeded_store();
        let tx = store.begin().unwrap();

        let room = tx.get_room(&RoomRef::new("Central", "Grad-Room")).unwrap().unwrap();
        assert_eq!(room.capacity, 4);
        assert_eq!(room.room_type, RoomType::GradOnly);
        assert!(tx.get_room(&RoomRef::new("Central", "Attic")).unwrap().is_none());

        let slot = tx.get_time_slot(2).unwrap().unwrap();
        assert_eq!(slot.duration(), chrono::Duration::minutes(90));
        assert!(tx.get_time_slot(9).unwrap().is_none());
        assert_eq!(tx.list_time_slots().unwrap().len(), 2);

        let found = tx
            .get_participants(&[pid("2222222"), pid("9999999")])
            .unwrap();
        assert_eq!(found.len(), 1);
        assert!(found[&pid("2222222")].is_grad_eligible());
    }

    #[test]
    fn test_reseed_replaces_program_links() {
        let store = seeded_store();
        let mut catalog = test_catalog();
        catalog.participants[1].programs.clear();
        store.seed_catalog(&catalog).unwrap();

        let tx = store.begin().unwrap();
        let found = tx.get_participants(&[pid("2222222")]).unwrap();
        assert!(found[&pid("2222222")].programs.is_empty());
    }

    #[test]
    fn test_reservation_uniqueness() {
        let store = seeded_store();
        let tx = store.begin().unwrap();

        let first = tx
            .insert_reservation(&booking("Lab-1", "2024-03-04", 1, &["1111111"]))
            .unwrap();
        assert_eq!(first.roster.len(), 1);
        assert_eq!(first.roster[0].attended, None);

        let second = tx.insert_reservation(&booking("Lab-1", "2024-03-04", 1, &["2222222"]));
        assert!(matches!(second, Err(StoreError::UniqueViolation(_))));

        // Different slot is fine
        tx.insert_reservation(&booking("Lab-1", "2024-03-04", 2, &["2222222"]))
            .unwrap();
    }

    #[test]
    fn test_rollback_on_drop() {
        let store = seeded_store();

        {
            let tx = store.begin().unwrap();
            tx.insert_reservation(&booking("Lab-1", "2024-03-04", 1, &["1111111"]))
                .unwrap();
            // Dropped without commit
        }

        let tx = store.begin().unwrap();
        assert!(tx.find_reservations(&ReservationFilter::new()).unwrap().is_empty());
    }

    #[test]
    fn test_commit_persists() {
        let store = seeded_store();

        let tx = store.begin().unwrap();
        let created = tx
            .insert_reservation(&booking("Lab-1", "2024-03-04", 1, &["1111111", "2222222"]))
            .unwrap();
        tx.commit().unwrap();

        let tx = store.begin().unwrap();
        let loaded = tx.get_reservation(created.id).unwrap().unwrap();
        assert_eq!(loaded, created);
    }

    #[test]
    fn test_state_and_attendance() {
        let store = seeded_store();
        let tx = store.begin().unwrap();
        let r = tx
            .insert_reservation(&booking("Lab-1", "2024-03-04", 1, &["1111111", "2222222"]))
            .unwrap();

        tx.set_attendance(r.id, &[pid("2222222")]).unwrap();
        tx.set_state(r.id, ReservationState::Completed).unwrap();

        let loaded = tx.get_reservation(r.id).unwrap().unwrap();
        assert_eq!(loaded.state, ReservationState::Completed);
        assert_eq!(loaded.roster[0].attended, Some(false));
        assert_eq!(loaded.roster[1].attended, Some(true));

        let missing = tx.set_state(ReservationId::new(999), ReservationState::Cancelled);
        assert!(matches!(missing, Err(StoreError::NotFound(_))));
    }

    #[test]
    fn test_quota_rows_filtering() {
        let store = seeded_store();
        let tx = store.begin().unwrap();

        tx.insert_reservation(&booking("Lab-1", "2024-03-04", 1, &["2222222"]))
            .unwrap();
        tx.insert_reservation(&booking("Grad-Room", "2024-03-04", 2, &["2222222"]))
            .unwrap();
        let cancelled = tx
            .insert_reservation(&booking("Lab-1", "2024-03-06", 2, &["2222222"]))
            .unwrap();
        tx.set_state(cancelled.id, ReservationState::Cancelled).unwrap();

        let p = pid("2222222");

        let day = tx
            .quota_rows(&QuotaQuery::on_day(p.clone(), date("2024-03-04")))
            .unwrap();
        assert_eq!(day.len(), 2);

        let open_day = tx
            .quota_rows(&QuotaQuery::on_day(p.clone(), date("2024-03-04")).room_type(RoomType::Open))
            .unwrap();
        assert_eq!(open_day.len(), 1);
        assert_eq!(open_day[0].slot.id, 1);

        let week_active = tx
            .quota_rows(
                &QuotaQuery::in_week_of(p.clone(), date("2024-03-07"))
                    .room_type(RoomType::Open)
                    .states(&[ReservationState::Active]),
            )
            .unwrap();
        assert_eq!(week_active.len(), 1);

        let week_any = tx
            .quota_rows(&QuotaQuery::in_week_of(p, date("2024-03-07")).room_type(RoomType::Open))
            .unwrap();
        assert_eq!(week_any.len(), 2);
    }

    #[test]
    fn test_find_reservations_filters() {
        let store = seeded_store();
        let tx = store.begin().unwrap();

        tx.insert_reservation(&booking("Lab-1", "2024-03-04", 1, &["1111111"]))
            .unwrap();
        tx.insert_reservation(&booking("Lab-1", "2024-03-05", 1, &["2222222"]))
            .unwrap();
        tx.insert_reservation(&booking("Grad-Room", "2024-03-05", 2, &["2222222"]))
            .unwrap();

        let all = tx.find_reservations(&ReservationFilter::new()).unwrap();
        assert_eq!(all.len(), 3);

        let by_participant = tx
            .find_reservations(&ReservationFilter::new().participant(pid("2222222")))
            .unwrap();
        assert_eq!(by_participant.len(), 2);

        let by_room_and_day = tx
            .find_reservations(
                &ReservationFilter::new()
                    .room(RoomRef::new("Central", "Lab-1"))
                    .on(date("2024-03-05")),
            )
            .unwrap();
        assert_eq!(by_room_and_day.len(), 1);
        assert_eq!(by_room_and_day[0].roster[0].participant, pid("2222222"));

        let cancelled = tx
            .find_reservations(&ReservationFilter::new().state(ReservationState::Cancelled))
            .unwrap();
        assert!(cancelled.is_empty());
    }

    #[test]
    fn test_slot_occupancy() {
        let store = seeded_store();
        let tx = store.begin().unwrap();

        let r = tx
            .insert_reservation(&booking("Lab-1", "2024-03-04", 2, &["1111111"]))
            .unwrap();

        let occupied = tx
            .slot_occupancy(&RoomRef::new("Central", "Lab-1"), date("2024-03-04"))
            .unwrap();
        assert_eq!(occupied.len(), 1);
        assert_eq!(occupied[&2], (r.id, ReservationState::Active));
    }

    #[test]
    fn test_sanction_ledger() {
        let store = seeded_store();
        let tx = store.begin().unwrap();
        let p = pid("1111111");

        let sanction = Sanction {
            participant: p.clone(),
            start: date("2024-01-10"),
            end: date("2024-03-10"),
        };
        assert!(tx.upsert_ignore_existing(&sanction).unwrap());

        // Same start is ignored, not extended
        let longer = Sanction {
            end: date("2024-06-10"),
            ..sanction.clone()
        };
        assert!(!tx.upsert_ignore_existing(&longer).unwrap());
        assert_eq!(tx.sanctions_for(&p).unwrap(), vec![sanction.clone()]);

        assert_eq!(tx.find_active(&p, date("2024-03-10")).unwrap(), Some(sanction));
        assert!(tx.find_active(&p, date("2024-03-11")).unwrap().is_none());
        assert!(tx.find_active(&p, date("2024-01-09")).unwrap().is_none());
    }
}
