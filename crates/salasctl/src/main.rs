//! salasctl - command-line front end for the salas reservation engine
//!
//! Wires together:
//! - Configuration loading
//! - Store initialization (schema migration happens at open)
//! - The reservation engine
//!
//! Results are printed to stdout as JSON; logs go to stderr. Engine
//! failures map to distinct exit codes (see [`exit_code`]).

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use salas_api::{AdmissionRequest, AttendanceRequest, ErrorKind, ReservationState};
use salas_config::{load_config, Policy};
use salas_core::{CoreError, ReservationEngine};
use salas_store::{ReservationFilter, SqliteStore, Store, SCHEMA_VERSION};
use salas_util::{default_config_path, ParticipantId, ReservationId, RoomRef};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// salasctl - shared room reservations
#[derive(Parser, Debug)]
#[command(name = "salasctl")]
#[command(about = "Admit, track and sanction shared-room reservations", long_about = None)]
struct Args {
    /// Configuration file path (default: ~/.config/salas/config.toml)
    #[arg(short, long, env = "SALAS_CONFIG", default_value_os_t = default_config_path())]
    config: PathBuf,

    /// Database path override
    #[arg(short, long, env = "SALAS_DATABASE")]
    database: Option<PathBuf>,

    /// Log level
    #[arg(short, long, default_value = "warn")]
    log_level: String,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create or upgrade the database schema
    Migrate,

    /// Load the configured catalog into the database
    Seed,

    /// Request a new reservation
    Admit {
        #[arg(long)]
        building: String,
        #[arg(long)]
        room: String,
        #[arg(long)]
        date: NaiveDate,
        #[arg(long)]
        slot: i64,
        /// Participant id (repeat for each roster member)
        #[arg(short, long = "participant", required = true)]
        participants: Vec<String>,
        /// Initial state (default: active)
        #[arg(long)]
        state: Option<String>,
    },

    /// Patch a reservation's state
    SetState { id: i64, state: String },

    /// Record attendance for a reservation
    Attend {
        id: i64,
        /// Participant who showed up (repeat for each)
        #[arg(short, long = "present")]
        present: Vec<String>,
        /// Do not sanction absentees of a no-show
        #[arg(long)]
        no_sanction: bool,
    },

    /// Show which slots of a room are taken on a date
    Availability {
        building: String,
        room: String,
        date: NaiveDate,
    },

    /// List reservations
    Reservations {
        #[arg(long)]
        building: Option<String>,
        /// Room name; requires --building
        #[arg(long, requires = "building")]
        room: Option<String>,
        #[arg(long)]
        from: Option<NaiveDate>,
        #[arg(long)]
        to: Option<NaiveDate>,
        #[arg(long)]
        state: Option<ReservationState>,
        #[arg(long)]
        participant: Option<String>,
    },

    /// Inspect or record sanctions
    #[command(subcommand)]
    Sanctions(SanctionCommand),

    /// Check that the database answers
    Health,
}

#[derive(Subcommand, Debug)]
enum SanctionCommand {
    /// Every sanction of a participant, newest first
    List { participant: String },

    /// Record a sanction by hand
    Issue {
        participant: String,
        #[arg(long)]
        start: NaiveDate,
        #[arg(long)]
        end: NaiveDate,
    },
}

/// Process exit code for an engine failure
fn exit_code(kind: ErrorKind) -> u8 {
    match kind {
        ErrorKind::Internal => 1,
        ErrorKind::Validation => 2,
        ErrorKind::NotFound => 3,
        ErrorKind::Conflict => 4,
    }
}

/// JSON body describing an engine failure
fn error_body(err: &CoreError) -> Value {
    let detail = match err {
        CoreError::NotFound(target) => serde_json::to_value(target).unwrap_or(Value::Null),
        CoreError::Conflict(reason) => serde_json::to_value(reason).unwrap_or(Value::Null),
        CoreError::Validation(_) | CoreError::Internal(_) => Value::Null,
    };

    json!({
        "error": err.kind(),
        "message": err.to_string(),
        "detail": detail,
    })
}

fn load_policy(args: &Args) -> Result<Policy> {
    let mut policy = if args.config.exists() {
        let policy = load_config(&args.config)
            .with_context(|| format!("Failed to load config from {:?}", args.config))?;
        info!(config_path = %args.config.display(), "Configuration loaded");
        policy
    } else {
        debug!(config_path = %args.config.display(), "No config file, using defaults");
        Policy::default()
    };

    if let Some(database) = &args.database {
        policy.store.database = database.clone();
    }
    Ok(policy)
}

fn open_store(policy: &Policy) -> Result<SqliteStore> {
    let db_path = &policy.store.database;
    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create data directory {:?}", parent))?;
    }

    let store = SqliteStore::open(db_path)
        .with_context(|| format!("Failed to open database {:?}", db_path))?;
    info!(db_path = %db_path.display(), "Store initialized");
    Ok(store)
}

/// Run one command; engine rejections come back as `Err(CoreError)` inside
/// `Ok` so the caller can print them, other failures abort.
fn execute(
    command: &Command,
    policy: &Policy,
    store: Arc<dyn Store>,
) -> Result<Result<Value, CoreError>> {
    let engine = ReservationEngine::new(policy.rules.clone(), store.clone());

    let outcome = match command {
        Command::Migrate => Ok(json!({
            "database": policy.store.database,
            "schema_version": SCHEMA_VERSION,
        })),

        Command::Seed => {
            let catalog = &policy.catalog;
            store
                .seed_catalog(catalog)
                .context("Failed to seed catalog")?;
            Ok(json!({
                "programs": catalog.programs.len(),
                "rooms": catalog.rooms.len(),
                "slots": catalog.slots.len(),
                "participants": catalog.participants.len(),
            }))
        }

        Command::Admit {
            building,
            room,
            date,
            slot,
            participants,
            state,
        } => {
            let mut request =
                AdmissionRequest::new(building, room, *date, *slot, participants.iter());
            request.state = state.clone();
            engine.admit_reservation(&request).map(to_json)
        }

        Command::SetState { id, state } => engine
            .change_state(ReservationId::new(*id), state)
            .map(to_json),

        Command::Attend {
            id,
            present,
            no_sanction,
        } => {
            let mut request = AttendanceRequest::new(present.iter());
            request.sanction_absentees = !no_sanction;
            engine
                .record_attendance(ReservationId::new(*id), &request)
                .map(to_json)
        }

        Command::Availability {
            building,
            room,
            date,
        } => engine.availability(building, room, *date).map(to_json),

        Command::Reservations {
            building,
            room,
            from,
            to,
            state,
            participant,
        } => reservation_filter(building, room, *from, *to, *state, participant.as_deref())
            .and_then(|filter| engine.list_reservations(&filter))
            .map(to_json),

        Command::Sanctions(SanctionCommand::List { participant }) => {
            engine.sanctions_for(participant).map(to_json)
        }

        Command::Sanctions(SanctionCommand::Issue {
            participant,
            start,
            end,
        }) => engine
            .issue_manual_sanction(participant, *start, *end)
            .map(to_json),

        Command::Health => Ok(json!({ "healthy": engine.health() })),
    };

    Ok(outcome)
}

fn reservation_filter(
    building: &Option<String>,
    room: &Option<String>,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    state: Option<ReservationState>,
    participant: Option<&str>,
) -> Result<ReservationFilter, CoreError> {
    let mut filter = ReservationFilter::new();

    match (building, room) {
        (Some(building), Some(room)) => filter = filter.room(RoomRef::new(building, room)),
        (Some(building), None) => filter = filter.building(building),
        _ => {}
    }

    filter.from = from;
    filter.to = to;
    filter.state = state;

    if let Some(participant) = participant {
        filter = filter.participant(ParticipantId::parse(participant)?);
    }

    Ok(filter)
}

fn to_json<T: serde::Serialize>(value: T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

fn run(args: &Args) -> Result<ExitCode> {
    let policy = load_policy(args)?;
    let store: Arc<dyn Store> = Arc::new(open_store(&policy)?);

    let (body, code) = match execute(&args.command, &policy, store)? {
        Ok(value) => {
            let healthy = value.get("healthy").and_then(Value::as_bool) != Some(false);
            (value, if healthy { 0 } else { 1 })
        }
        Err(err) => (error_body(&err), exit_code(err.kind())),
    };

    println!(
        "{}",
        serde_json::to_string_pretty(&body).context("Failed to encode output")?
    );
    Ok(ExitCode::from(code))
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);
    if args.json_logs {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    debug!(version = env!("CARGO_PKG_VERSION"), "salasctl starting");

    run(&args)
}
