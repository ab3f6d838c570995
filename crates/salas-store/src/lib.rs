//! Persistence layer for salas
//!
//! Provides:
//! - Read access to the room/slot/participant catalog
//! - Reservation and roster persistence with the (room, date, slot)
//!   uniqueness invariant
//! - The sanction ledger
//! - Audit log (append-only)
//! - Strict-isolation transactions scoped to one engine call
//! - Versioned, idempotent schema migration at open

mod audit;
mod migrations;
mod query;
mod sqlite;
mod traits;

pub use audit::*;
pub use migrations::SCHEMA_VERSION;
pub use query::*;
pub use sqlite::*;
pub use traits::*;

use thiserror::Error;

/// Store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Uniqueness violated: {0}")]
    UniqueViolation(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        match &e {
            rusqlite::Error::SqliteFailure(err, msg)
                if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    || err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY =>
            {
                StoreError::UniqueViolation(msg.clone().unwrap_or_else(|| e.to_string()))
            }
            _ => StoreError::Database(e.to_string()),
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
